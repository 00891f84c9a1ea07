//! Backend entry-point: loads settings, connects the upstream stack, and
//! serves the aggregate views.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::upstream::UpstreamStack;
use backend::settings::PulseSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PulseSettings::load_layers().map_err(config_failure)?;
    let upstream = settings.upstream().map_err(config_failure)?;
    let server_settings = settings.server().map_err(config_failure)?;

    let stack = UpstreamStack::connect(&upstream, Arc::new(DefaultClock)).map_err(|e| {
        error!(error = %e, "failed to build upstream client");
        std::io::Error::other(format!("failed to build upstream client: {e}"))
    })?;

    let config = ServerConfig::new(&server_settings, Arc::new(stack.aggregator()));
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}

fn config_failure(e: backend::settings::ConfigError) -> std::io::Error {
    error!(error = %e, "invalid configuration");
    std::io::Error::other(format!("invalid configuration: {e}"))
}
