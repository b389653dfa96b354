//! Tracing subscriber installation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{PrerenderError, Result};

/// Install the global subscriber. `RUST_LOG` wins; otherwise `--verbose`
/// picks debug over info.
pub fn init(verbose: bool) -> Result<()> {
    let fallback = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact().with_target(true))
        .try_init()
        .map_err(|err| {
            PrerenderError::config(format!("failed to install tracing subscriber: {err}"))
        })
}
