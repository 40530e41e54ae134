use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use stockcast_dashboard::app;
use stockcast_dashboard::config::DashboardConfig;
use stockcast_dashboard::external::arima_http::HttpForecastService;
use stockcast_dashboard::logging::{init_logging, LoggingConfig};
use stockcast_dashboard::services::dashboard_controller::DashboardController;
use stockcast_dashboard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = DashboardConfig::from_env().context("invalid configuration")?;

    let service = HttpForecastService::new(&config.forecast_api_base, config.service_timeout)
        .context("failed to build forecast service client")?;
    tracing::info!("📈 Using statistics service at {}", service.base_url());

    let controller = DashboardController::new(Arc::new(service), config.default_params.clone());
    let state = AppState {
        controller: Arc::new(controller),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Stockcast dashboard backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
