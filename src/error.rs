use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrerenderError {
    /// The requested render target is not an absolute http(s) URL. Recovered
    /// at the HTTP boundary with a fixed sentinel body; never reaches the
    /// orchestrator.
    #[error("Invalid render target: {0}")]
    InvalidInput(String),

    /// The browser session stopped answering at the transport level. The
    /// session is discarded on release so the pool can replace it.
    #[error("Browser session unresponsive: {0}")]
    SessionUnresponsive(String),

    /// The page failed to load. The session itself is healthy and is
    /// released for reuse.
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Script evaluation inside the page failed.
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// A render attempt exceeded its overall deadline. The session is still
    /// released before this surfaces.
    #[error("Render attempt exceeded {0:?} deadline")]
    DeadlineExceeded(Duration),

    /// Every attempt failed; carries the error from the final attempt.
    #[error("Render failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<PrerenderError>,
    },

    #[error("Session pool error: {0}")]
    Pool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrerenderError {
    /// Whether the underlying session should be discarded rather than
    /// returned to circulation.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, PrerenderError::SessionUnresponsive(_))
    }

    pub fn pool(message: impl Into<String>) -> Self {
        PrerenderError::Pool(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        PrerenderError::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PrerenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresponsive_session_is_fatal() {
        let err = PrerenderError::SessionUnresponsive("pipe closed".to_string());
        assert!(err.is_session_fatal());
    }

    #[test]
    fn page_level_errors_are_not_fatal() {
        assert!(!PrerenderError::Navigation("ERR_NAME_NOT_RESOLVED".to_string()).is_session_fatal());
        assert!(!PrerenderError::DeadlineExceeded(Duration::from_secs(30)).is_session_fatal());
        assert!(!PrerenderError::Evaluation("ReferenceError".to_string()).is_session_fatal());
    }

    #[test]
    fn retries_exhausted_reports_attempts_and_cause() {
        let err = PrerenderError::RetriesExhausted {
            attempts: 3,
            source: Box::new(PrerenderError::SessionUnresponsive("gone".to_string())),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("after 3 attempts"), "got: {msg}");
        assert!(msg.contains("unresponsive"), "got: {msg}");
    }
}
