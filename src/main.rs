mod cli;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use prerender_lib::{
    ensure_node_available, ensure_playwright_available, router, spawn_sweeper, Config,
    DriverOptions, DriverPool, DriverSessionFactory, PoolEvent, PoolObserver, ReadinessProber,
    RenderCache, RenderOptions, Renderer, ServerContext, SessionPool,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("prerender: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> prerender_lib::Result<()> {
    let args = cli::parse();
    prerender_lib::telemetry::init(args.verbose)?;

    let config = Config::load(args.config.as_deref())?;
    let config = settings::resolve(&args, config)?;

    // Fail fast before spawning anything if the driver stack is missing.
    ensure_node_available(&config.node_command).await?;
    ensure_playwright_available(&config.node_command).await?;

    let factory = DriverSessionFactory::shared(DriverOptions::from(&config));
    let observer: PoolObserver = Arc::new(|event| match event {
        PoolEvent::SessionDiscarded { reason } => {
            warn!(reason = %reason, "browser session discarded");
        }
        PoolEvent::ReplacementFailed { error } => {
            error!(error = %error, "browser session replacement failed");
        }
    });
    let pool: Arc<dyn SessionPool> = Arc::new(DriverPool::with_observer(
        factory,
        config.pool_size,
        Some(observer),
    ));

    info!(pool_size = config.pool_size, "warming session pool");
    pool.ready().await?;

    let cache = Arc::new(RenderCache::new(config.cache_ttl));
    let _sweeper = spawn_sweeper(Arc::clone(&cache), config.sweep_interval);

    let renderer = Arc::new(Renderer::new(
        pool,
        ReadinessProber::new(&config.ready_expression),
        RenderOptions::from(&config),
    ));

    let ctx = Arc::new(ServerContext { cache, renderer });
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind((config.address.as_str(), config.port)).await?;
    info!(address = %listener.local_addr()?, "accepting render requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
