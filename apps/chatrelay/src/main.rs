use anyhow::Context;
use chatrelay_core::{Core, bootstrap_from_env};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("chatrelay failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let boot = bootstrap_from_env()?;
    let config = &boot.config;
    info!(
        host = %config.host,
        port = config.port,
        proxy = %config.proxy.as_deref().unwrap_or(""),
        max_history = config.max_history,
        providers = config.providers.len(),
        brand = %config.brand.name,
        "config loaded"
    );

    let core = Core::new(boot.dispatcher.clone());
    let app = core.router();

    let bind = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    info!("shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chatrelay=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "ctrl-c handler unavailable; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
