//! AskDB Server - Main entry point.
//!
//! Serves `POST /query`: a natural-language question in, read-only SQL and its
//! result out.

use askdb_server::config::Config;
use askdb_server::pipeline::Pipeline;
use askdb_server::transport::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal outside local development.
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::parse_args();
    init_tracing(&config);

    info!(
        dotenv = dotenv_loaded,
        "Starting AskDB Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        database_url_set = config.database_url().is_ok(),
        backend_key_set = config.backend_credential().is_some(),
        "Loaded configuration"
    );
    if let Some(url) = config.masked_database_url() {
        info!(database_url = %url, "Database configured");
    } else {
        warn!("DATABASE_URL is not set");
    }

    let pipeline = match Pipeline::from_config(&config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(error = %e, "Failed to initialize pipeline");
            return Err(e.into());
        }
    };

    info!(
        strategy = pipeline.translator().strategy_name(),
        db_type = %pipeline.pool().db_type(),
        "Pipeline ready"
    );

    let transport = HttpTransport::new(
        pipeline,
        &config.http_host,
        config.port,
        config.allowed_origin_list(),
    );
    info!(transport = transport.name(), addr = %transport.bind_addr(), "Using HTTP transport");

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
