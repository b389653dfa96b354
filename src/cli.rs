use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "prerender")]
#[command(
    version,
    about = "Prerender service - render JavaScript-heavy pages to static HTML for crawlers",
    long_about = "Prerender service\n\nServes GET /<url-encoded-absolute-url> and answers with the page's\nrendered HTML. Browser sessions come from a fixed-size Playwright pool\nwarmed before the listener accepts traffic; valid renders are cached\nwith a TTL."
)]
pub struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Optional config file (TOML) to set defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Listen address (overrides config)")]
    pub address: Option<String>,

    #[arg(long, help = "Listen port (overrides config)")]
    pub port: Option<u16>,

    #[arg(long, help = "Number of browser sessions in the pool (overrides config)")]
    pub pool_size: Option<usize>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "prerender",
            "--config",
            "service.toml",
            "--port",
            "8080",
            "--pool-size",
            "4",
            "--verbose",
        ]);
        assert_eq!(cli.config.as_deref().unwrap().to_str(), Some("service.toml"));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.pool_size, Some(4));
        assert!(cli.address.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn all_flags_optional() {
        let cli = Cli::parse_from(["prerender"]);
        assert!(cli.config.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.verbose);
    }
}
