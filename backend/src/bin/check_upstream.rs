//! Check that the configured upstream service is reachable and answers in a
//! recognised shape.
//!
//! Uses the same `PULSE_*` settings as the server. Exits non-zero on the
//! first failing step.

use std::process::ExitCode;
use std::sync::Arc;

use mockable::DefaultClock;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::outbound::upstream::{UpstreamStack, probe};
use backend::settings::PulseSettings;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let upstream = match PulseSettings::load_layers().and_then(|settings| settings.upstream()) {
        Ok(upstream) => upstream,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(base_url = %upstream.endpoints.base(), identity = ?upstream.identity, "probing upstream");

    let stack = match UpstreamStack::connect(&upstream, Arc::new(DefaultClock)) {
        Ok(stack) => stack,
        Err(e) => {
            error!(error = %e, "failed to build upstream client");
            return ExitCode::FAILURE;
        }
    };

    match probe(&stack).await {
        Ok(report) => {
            info!(?report, "upstream checks passed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "upstream check failed");
            ExitCode::FAILURE
        }
    }
}
