//! Session and pool trait boundary.
//!
//! The orchestrator only sees these traits. A `Session` is a controllable
//! browser instance owned exclusively by one in-flight render; the pool
//! hands it out on `acquire` and takes it back exactly once on `release`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A live browser session: navigation, script evaluation, DOM serialization.
#[async_trait]
pub trait Session: Send {
    /// Load `url`. Resolves on the page's load event; readiness beyond that
    /// is the prober's concern.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression in the page and return its JSON
    /// value. `undefined` maps to `Value::Null`.
    async fn evaluate(&mut self, expression: &str) -> Result<Value>;

    /// Serialize the current DOM to an HTML string.
    async fn content(&mut self) -> Result<String>;
}

/// How a session goes back to the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    /// Drop the session instead of recirculating it; the pool replaces it.
    pub discard: bool,
}

impl ReleaseOptions {
    pub fn discard() -> Self {
        Self { discard: true }
    }
}

/// Bounded pool of browser sessions. The sole gatekeeper for render
/// parallelism: `acquire` suspends the caller until a session is free.
#[async_trait]
pub trait SessionPool: Send + Sync {
    /// Take exclusive ownership of a session, waiting for one if none is
    /// idle.
    async fn acquire(&self) -> Result<Box<dyn Session>>;

    /// Return a session. With `discard` set the session is dropped and a
    /// replacement is provisioned.
    async fn release(&self, session: Box<dyn Session>, opts: ReleaseOptions) -> Result<()>;

    /// Warm the pool to capacity. Called once before the listener accepts
    /// traffic.
    async fn ready(&self) -> Result<()>;
}

/// Out-of-band pool notifications, delivered through an injected callback
/// rather than an event-emitter surface.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A session was dropped after a fatal failure.
    SessionDiscarded { reason: String },
    /// Provisioning a replacement for a discarded session failed; the pool
    /// continues with reduced capacity.
    ReplacementFailed { error: String },
}

pub type PoolObserver = Arc<dyn Fn(PoolEvent) + Send + Sync>;
