//! Service configuration: defaults, TOML loading, validation.
//!
//! All values have working defaults; a TOML file passed via `--config`
//! overrides them, and a handful of CLI flags override the file in turn
//! (see the binary's `settings` module).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PrerenderError, Result};

/// Default poll cadence, readiness and deadline knobs. Kept as consts so the
/// tests and the docs agree on a single source.
pub const DEFAULT_EXPLICIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_IMPLICIT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(25);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// JavaScript expression a page uses to declare readiness.
pub const DEFAULT_READY_EXPRESSION: &str = "window.prerenderReady";

/// Selector whose presence marks a render as valid for caching.
pub const DEFAULT_MARKER_SELECTOR: &str = "#prerender-status";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listen address for the HTTP surface.
    pub address: String,
    pub port: u16,
    /// Number of browser sessions kept in the pool.
    pub pool_size: usize,
    /// How long to keep polling a page that reports `NotReady`.
    #[serde(with = "humantime_serde")]
    pub explicit_timeout: Duration,
    /// Settle period for pages that do not implement the readiness signal.
    #[serde(with = "humantime_serde")]
    pub implicit_timeout: Duration,
    /// Hard deadline for one acquire-through-extract attempt.
    #[serde(with = "humantime_serde")]
    pub render_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Additional attempts after the first failed one.
    pub max_retries: u32,
    pub marker_selector: String,
    pub ready_expression: String,
    /// Node.js command used to spawn the Playwright helper.
    pub node_command: String,
    #[serde(with = "humantime_serde")]
    pub navigation_timeout: Duration,
    /// Transport-level ceiling for a single driver command round-trip.
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
    /// File the driver helpers append their stderr to.
    pub driver_log_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3000,
            pool_size: 2,
            explicit_timeout: DEFAULT_EXPLICIT_TIMEOUT,
            implicit_timeout: DEFAULT_IMPLICIT_TIMEOUT,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_retries: 2,
            marker_selector: DEFAULT_MARKER_SELECTOR.to_string(),
            ready_expression: DEFAULT_READY_EXPRESSION.to_string(),
            node_command: "node".to_string(),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            driver_log_path: "prerender-driver.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit TOML path, or defaults when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path).map_err(|e| {
            PrerenderError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let cfg: Config = toml::from_str(&raw).map_err(|e| {
            PrerenderError::config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(PrerenderError::config("pool_size must be at least 1"));
        }
        if self.render_timeout.is_zero() {
            return Err(PrerenderError::config("render_timeout must be non-zero"));
        }
        if self.marker_selector.trim().is_empty() {
            return Err(PrerenderError::config("marker_selector must not be empty"));
        }
        if self.ready_expression.trim().is_empty() {
            return Err(PrerenderError::config("ready_expression must not be empty"));
        }
        Ok(())
    }
}
