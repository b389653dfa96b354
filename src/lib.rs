//! Prerender Service Library
//!
//! Renders dynamic, JavaScript-heavy pages to static HTML on behalf of
//! callers that cannot execute scripts (crawlers, feed fetchers). The core
//! is the render orchestrator: it borrows a browser session from a bounded
//! pool, drives it through navigation and readiness detection, decides
//! cacheability, enforces a per-attempt deadline, retries on session
//! failure, and always returns the session to the pool.
//!
//! # Module Overview
//!
//! - [`render`] - Render orchestration state machine
//! - [`pool`] - Bounded session pool over a session factory
//! - [`driver`] - Playwright helper processes implementing sessions
//! - [`probe`] - Tri-state page readiness probing
//! - [`cache`] - TTL-keyed cache of rendered HTML
//! - [`server`] - HTTP surface (`GET /<url-encoded-absolute-url>`)
//! - [`config`] - Configuration defaults, TOML loading, validation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use prerender_lib::{
//!     Config, DriverOptions, DriverPool, DriverSessionFactory, ReadinessProber, RenderOptions,
//!     Renderer, SessionPool,
//! };
//!
//! # async fn example() -> prerender_lib::Result<()> {
//! let config = Config::default();
//! let factory = DriverSessionFactory::shared(DriverOptions::from(&config));
//! let pool = Arc::new(DriverPool::new(factory, config.pool_size));
//! pool.ready().await?;
//!
//! let renderer = Renderer::new(
//!     pool,
//!     ReadinessProber::new(&config.ready_expression),
//!     RenderOptions::from(&config),
//! );
//! let outcome = renderer.render("https://example.com/").await?;
//! println!("valid: {}, {} bytes", outcome.valid, outcome.html.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod pool;
pub mod probe;
pub mod render;
pub mod server;
pub mod session;
pub mod telemetry;

pub use cache::{spawn_sweeper, RenderCache};
pub use config::Config;
pub use driver::{
    ensure_node_available, ensure_playwright_available, DriverOptions, DriverSession,
    DriverSessionFactory,
};
pub use error::{PrerenderError, Result};
pub use pool::{DriverPool, SessionFactory};
pub use probe::{Readiness, ReadinessProber};
pub use render::{RenderOptions, RenderOutcome, Renderer, READINESS_POLL_INTERVAL};
pub use server::{router, ServerContext, INVALID_URL_SENTINEL, RENDER_FAILED_BODY};
pub use session::{PoolEvent, PoolObserver, ReleaseOptions, Session, SessionPool};
