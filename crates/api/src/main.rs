use std::sync::Arc;

use anyhow::Context;

use stockdate_api::app;
use stockdate_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockdate_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.admin_token.is_none() {
        tracing::warn!("STOCKDATE_ADMIN_TOKEN not set; admin endpoints are unauthenticated");
    }

    let services = Arc::new(app::build_services(config.clone()).await?);
    services.ensure_sweep_scheduled()?;
    let runner = services.spawn_job_runner()?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app::router(services))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tokio::task::spawn_blocking(move || runner.shutdown()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
