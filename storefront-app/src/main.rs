//! # Storefront Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the HTTP client for the catalog, rate and contact services
//! - Create the storefront service and start the rate refresh timer
//! - Start the HTTP server

mod config;

use chrono::Utc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use storefront_client::StorefrontClient;
use storefront_hex::service::ControllerSettings;
use storefront_hex::{StorefrontService, inbound::HttpServer};
use storefront_types::{ExchangeRate, ViewMode};

use config::{Config, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,storefront_app=debug,storefront_hex=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Starting storefront server on port {}", config.port);
    tracing::info!(
        catalog = %config.catalog_api_url,
        rates = %config.rates_api_url,
        "Using upstream services"
    );

    let mut client = StorefrontClient::new(&config.catalog_api_url, &config.rates_api_url)?;
    if let Some(contact) = &config.contact_api_url {
        client = client.with_contact_url(contact);
    }

    let service = StorefrontService::with_options(
        client,
        ExchangeRate::new(config.default_exchange_rate, Utc::now())?,
        config.rate_refresh,
        ControllerSettings {
            page_size: config.page_size,
            view_mode: ViewMode::Grid,
        },
    );

    // Timer stops when this handle is dropped
    let rate_refresh = service.spawn_rate_refresh();

    // A failed first load is recorded in /api/status; the server still starts.
    let status = service.reload().await;
    if let Some(err) = &status.last_error {
        tracing::warn!(error = %err.message, "initial catalog load failed");
    }

    let server = HttpServer::with_rate_limit(service, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    rate_refresh.cancel();
    Ok(())
}
