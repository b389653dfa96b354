//! Render orchestration.
//!
//! One attempt is the full acquire → navigate → probe → validate → extract →
//! release sequence, bounded by the render deadline. Release is
//! unconditional: whatever steps 2-5 do, the session goes back to the pool
//! exactly once before any error propagates. Failed attempts retry from
//! acquire with a fresh session and a fresh deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, timeout_at, Instant};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{PrerenderError, Result};
use crate::probe::{Readiness, ReadinessProber};
use crate::session::{ReleaseOptions, Session, SessionPool};

/// Cadence of the explicit readiness poll loop.
pub const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of one render: the serialized document, and whether the marker
/// element was present (only valid outcomes are cacheable).
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub valid: bool,
    pub html: String,
}

/// Orchestrator knobs, lifted from [`Config`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Hard deadline for one attempt, acquire through extract.
    pub render_timeout: Duration,
    /// How long a `NotReady` page gets to turn `Ready`.
    pub explicit_timeout: Duration,
    /// Settle period for pages without the readiness signal.
    pub implicit_timeout: Duration,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Selector whose presence marks the outcome as valid.
    pub marker_selector: String,
}

impl From<&Config> for RenderOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            render_timeout: cfg.render_timeout,
            explicit_timeout: cfg.explicit_timeout,
            implicit_timeout: cfg.implicit_timeout,
            max_retries: cfg.max_retries,
            marker_selector: cfg.marker_selector.clone(),
        }
    }
}

/// Drives sessions from the pool through the render state machine.
pub struct Renderer {
    pool: Arc<dyn SessionPool>,
    prober: ReadinessProber,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(pool: Arc<dyn SessionPool>, prober: ReadinessProber, options: RenderOptions) -> Self {
        Self {
            pool,
            prober,
            options,
        }
    }

    /// Render `url`, retrying failed attempts with fresh sessions. The URL
    /// has already been validated at the HTTP boundary.
    pub async fn render(&self, url: &str) -> Result<RenderOutcome> {
        let attempts = self.options.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.attempt(url).await {
                Ok(outcome) => {
                    debug!(attempt, valid = outcome.valid, url, "render finished");
                    return Ok(outcome);
                }
                Err(err) => {
                    warn!(attempt, of = attempts, url, error = %err, "render attempt failed");
                    last_error = Some(err);
                }
            }
        }

        let source =
            last_error.unwrap_or_else(|| PrerenderError::pool("render loop ran no attempts"));
        Err(PrerenderError::RetriesExhausted {
            attempts,
            source: Box::new(source),
        })
    }

    /// One acquire-through-release attempt. The deadline covers acquisition
    /// and page driving; release runs outside it so the session is never
    /// lost to a timeout.
    async fn attempt(&self, url: &str) -> Result<RenderOutcome> {
        let deadline = Instant::now() + self.options.render_timeout;

        let mut session = match timeout_at(deadline, self.pool.acquire()).await {
            Ok(acquired) => acquired?,
            Err(_) => return Err(PrerenderError::DeadlineExceeded(self.options.render_timeout)),
        };

        let outcome = match timeout_at(deadline, self.drive(&mut session, url)).await {
            Ok(result) => result,
            Err(_) => Err(PrerenderError::DeadlineExceeded(self.options.render_timeout)),
        };

        let discard = outcome
            .as_ref()
            .err()
            .is_some_and(PrerenderError::is_session_fatal);
        if let Err(release_err) = self
            .pool
            .release(session, ReleaseOptions { discard })
            .await
        {
            // The attempt outcome wins; a release failure is the pool's
            // problem to report.
            warn!(error = %release_err, "failed to return session to pool");
        }

        outcome
    }

    /// Steps 2-5: navigate, settle readiness, validate the marker, extract.
    async fn drive(&self, session: &mut Box<dyn Session>, url: &str) -> Result<RenderOutcome> {
        session.navigate(url).await?;

        match self.prober.probe(session).await? {
            Readiness::Ready => {}
            Readiness::Unknown => {
                // No signal on this page; a single fixed settle period.
                debug!(url, "no readiness signal, sleeping implicit timeout");
                sleep(self.options.implicit_timeout).await;
            }
            Readiness::NotReady => self.await_explicit_ready(session, url).await?,
        }

        let valid = self.marker_present(session).await?;
        let html = session.content().await?;
        Ok(RenderOutcome { valid, html })
    }

    /// Poll a `NotReady` page until it declares ready or the explicit window
    /// closes. Closing the window is not an error: the page opted into the
    /// signal and never fired it, so we return best-effort output instead of
    /// failing the render.
    async fn await_explicit_ready(&self, session: &mut Box<dyn Session>, url: &str) -> Result<()> {
        let window_closes = Instant::now() + self.options.explicit_timeout;

        loop {
            let next_poll = Instant::now() + READINESS_POLL_INTERVAL;
            if next_poll >= window_closes {
                sleep_until(window_closes).await;
                debug!(url, "explicit readiness window elapsed, proceeding as-is");
                return Ok(());
            }
            sleep_until(next_poll).await;
            if self.prober.probe(session).await? == Readiness::Ready {
                return Ok(());
            }
        }
    }

    async fn marker_present(&self, session: &mut Box<dyn Session>) -> Result<bool> {
        let expression = format!(
            "!!document.querySelector({})",
            serde_json::to_string(&self.options.marker_selector)?
        );
        let value = session.evaluate(&expression).await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}
