use std::{net::SocketAddr, process::ExitCode, sync::Arc};
use stockviz::{
    config::AppConfig,
    dashboard::Dashboard,
    error::{AppError, Result},
    retrieval::PriceTableCache,
    yahoo::YahooClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing before config so load failures are logged
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "stockviz stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let app_config = AppConfig::load()?;

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting stockviz");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        provider = %app_config.provider_base_url,
        companies = ?app_config.registry.names(),
        "Loaded configuration"
    );

    let client = YahooClient::new(&app_config.provider_base_url, app_config.provider_timeout)
        .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;
    let cache = PriceTableCache::new(Arc::new(client));
    let dashboard = Dashboard::new(&app_config, cache);

    let app = stockviz::router(dashboard, Some(&app_config.governor))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;
    Ok(())
}
