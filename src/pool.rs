//! Bounded session pool backed by an idle-session channel.
//!
//! The pool is warmed to capacity before the listener accepts traffic.
//! Acquire suspends the calling render until a session is idle; backpressure
//! for requests beyond capacity lives entirely here. Discarded sessions are
//! replaced in the background so a broken browser never reenters circulation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::error::{PrerenderError, Result};
use crate::session::{PoolEvent, PoolObserver, ReleaseOptions, Session, SessionPool};

/// Provisions new sessions, both at warm-up and when replacing a discarded
/// one.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn Session>>;
}

/// Fixed-size pool over a [`SessionFactory`].
pub struct DriverPool {
    factory: Arc<dyn SessionFactory>,
    size: usize,
    idle_tx: mpsc::Sender<Box<dyn Session>>,
    idle_rx: Mutex<mpsc::Receiver<Box<dyn Session>>>,
    observer: Option<PoolObserver>,
}

impl DriverPool {
    pub fn new(factory: Arc<dyn SessionFactory>, size: usize) -> Self {
        Self::with_observer(factory, size, None)
    }

    pub fn with_observer(
        factory: Arc<dyn SessionFactory>,
        size: usize,
        observer: Option<PoolObserver>,
    ) -> Self {
        let size = size.max(1);
        let (idle_tx, idle_rx) = mpsc::channel(size);
        Self {
            factory,
            size,
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            observer,
        }
    }

    fn notify(&self, event: PoolEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    /// Replace a discarded session without blocking the releasing render.
    fn spawn_replacement(&self) {
        let factory = Arc::clone(&self.factory);
        let idle_tx = self.idle_tx.clone();
        let observer = self.observer.clone();
        tokio::spawn(async move {
            match factory.create().await {
                Ok(session) => {
                    if idle_tx.send(session).await.is_err() {
                        debug!("pool closed before replacement session was returned");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to replace discarded session");
                    if let Some(observer) = observer {
                        observer(PoolEvent::ReplacementFailed {
                            error: err.to_string(),
                        });
                    }
                }
            }
        });
    }
}

#[async_trait]
impl SessionPool for DriverPool {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        let mut idle = self.idle_rx.lock().await;
        idle.recv()
            .await
            .ok_or_else(|| PrerenderError::pool("session channel closed"))
    }

    async fn release(&self, session: Box<dyn Session>, opts: ReleaseOptions) -> Result<()> {
        if opts.discard {
            drop(session);
            self.notify(PoolEvent::SessionDiscarded {
                reason: "released with discard".to_string(),
            });
            self.spawn_replacement();
            return Ok(());
        }

        self.idle_tx
            .send(session)
            .await
            .map_err(|_| PrerenderError::pool("session channel closed"))
    }

    async fn ready(&self) -> Result<()> {
        let spawns = (0..self.size).map(|_| self.factory.create());
        let sessions = futures::future::try_join_all(spawns).await?;
        for session in sessions {
            self.idle_tx
                .send(session)
                .await
                .map_err(|_| PrerenderError::pool("session channel closed"))?;
        }
        debug!(size = self.size, "session pool warmed");
        Ok(())
    }
}
