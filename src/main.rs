/// Hoaxify account backend
use hoaxify::{
    config::{LoggingConfig, ServerConfig, DEFAULT_LOG_FILTER},
    context::AppContext,
    error::HoaxResult,
    jobs::JobScheduler,
    server,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> HoaxResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    init_tracing(&config.logging);

    tracing::info!("Starting Hoaxify v{}", env!("CARGO_PKG_VERSION"));

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start background jobs
    let jobs = JobScheduler::new(Arc::new(ctx.clone())).start();

    // Serve until Ctrl-C
    let result = server::serve(ctx, shutdown_signal()).await;

    jobs.shutdown().await;

    result
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving until the process is killed
        std::future::pending::<()>().await;
    }

    tracing::info!("Gracefully shutting down");
}
