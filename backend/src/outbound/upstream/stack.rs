//! Wiring of transport, credential cache, fetcher, and aggregator.

use std::sync::Arc;

use mockable::Clock;

use super::ReqwestUpstreamTransport;
use crate::domain::ports::UpstreamTransport;
use crate::domain::{
    CredentialCache, GraphAggregator, ResilientFetcher, RetrySleeper, TokioSleeper,
    UpstreamEndpoints,
};
use crate::settings::UpstreamConfig;

/// Shared upstream services built from one [`UpstreamConfig`].
///
/// The credential cache is shared by the fetcher and therefore by every
/// aggregator built from the stack.
#[derive(Clone)]
pub struct UpstreamStack {
    /// Resource URL builder.
    pub endpoints: UpstreamEndpoints,
    /// Cached upstream credential.
    pub credentials: Arc<CredentialCache>,
    /// Authenticated GET with retries.
    pub fetcher: Arc<ResilientFetcher>,
    clock: Arc<dyn Clock>,
    fan_out: usize,
}

impl UpstreamStack {
    /// Build the stack on a reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn connect(config: &UpstreamConfig, clock: Arc<dyn Clock>) -> Result<Self, reqwest::Error> {
        let transport = ReqwestUpstreamTransport::new(config.request_timeout, &config.user_agent)?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            clock,
            Arc::new(TokioSleeper),
        ))
    }

    /// Build the stack on an arbitrary transport and sleeper.
    pub fn with_transport(
        config: &UpstreamConfig,
        transport: Arc<dyn UpstreamTransport>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
    ) -> Self {
        let credentials = Arc::new(
            CredentialCache::new(
                transport.clone(),
                clock.clone(),
                config.identity.clone(),
                config.endpoints.auth(),
            )
            .with_safety_margin(config.token_safety_margin),
        );
        let fetcher = Arc::new(ResilientFetcher::with_sleeper(
            transport,
            credentials.clone(),
            config.retry_policy(),
            sleeper,
        ));
        Self {
            endpoints: config.endpoints.clone(),
            credentials,
            fetcher,
            clock,
            fan_out: config.fan_out,
        }
    }

    /// Aggregator sharing this stack's fetcher and credential cache.
    #[must_use]
    pub fn aggregator(&self) -> GraphAggregator {
        GraphAggregator::new(
            self.fetcher.clone(),
            self.endpoints.clone(),
            self.clock.clone(),
        )
        .with_fan_out(self.fan_out)
    }
}
