//! Merge CLI flags over the loaded config file.

use prerender_lib::{Config, Result};

use crate::cli::Cli;

/// Apply CLI overrides and re-validate the result (a flag can introduce an
/// invalid value just as easily as a file can).
pub fn resolve(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(address) = &cli.address {
        config.address = address.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(pool_size) = cli.pool_size {
        config.pool_size = pool_size;
    }
    config.validate()?;
    Ok(config)
}
