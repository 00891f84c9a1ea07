//! Authenticated upstream `GET` with bounded retries.
//!
//! Every attempt asks the [`CredentialCache`] for the current credential.
//! Transport failures, 5xx replies, and unusable 2xx bodies are retried with
//! the policy's backoff. A 401/403 forces one credential refresh and an
//! immediate retry. Other statuses fail at once.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use super::credential_cache::CredentialCache;
use super::ports::UpstreamTransport;
use super::upstream_error::UpstreamError;

mod attempt;
mod policy;
mod runtime;

use attempt::{AttemptFailure, AttemptOutcome};
pub use policy::{BackoffStrategy, LinearBackoff, RetryPolicy};
pub use runtime::{RetrySleeper, TokioSleeper};

/// Upstream reader shared by every aggregation request.
pub struct ResilientFetcher {
    transport: Arc<dyn UpstreamTransport>,
    credentials: Arc<CredentialCache>,
    policy: RetryPolicy,
    sleeper: Arc<dyn RetrySleeper>,
}

impl ResilientFetcher {
    /// Build a fetcher that sleeps with tokio between attempts.
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        credentials: Arc<CredentialCache>,
        policy: RetryPolicy,
    ) -> Self {
        Self::with_sleeper(transport, credentials, policy, Arc::new(TokioSleeper))
    }

    /// Build a fetcher with an injected sleeper.
    pub fn with_sleeper(
        transport: Arc<dyn UpstreamTransport>,
        credentials: Arc<CredentialCache>,
        policy: RetryPolicy,
        sleeper: Arc<dyn RetrySleeper>,
    ) -> Self {
        Self {
            transport,
            credentials,
            policy,
            sleeper,
        }
    }

    /// Retry policy in force.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `url` and parse the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Auth`] when no credential can be obtained.
    /// - [`UpstreamError::Fetch`] when attempts are exhausted or upstream
    ///   answers with a non-retryable status. `last_status` carries the final
    ///   status seen, if any.
    pub async fn fetch(&self, url: &Url) -> Result<Value, UpstreamError> {
        let max_attempts = self.policy.max_attempts();
        let mut refreshed = false;
        let mut last_failure = AttemptFailure {
            status: None,
            message: "no attempt made".to_owned(),
        };

        for attempt in 1..=max_attempts {
            let credential = self.credentials.get_token().await?;
            let result = self.transport.get(url, &credential.authorization()).await;

            match AttemptOutcome::classify(result) {
                AttemptOutcome::Success(value) => {
                    debug!(%url, attempt, "upstream fetch succeeded");
                    return Ok(value);
                }
                AttemptOutcome::Rejected(failure) if !refreshed && attempt < max_attempts => {
                    warn!(%url, attempt, status = ?failure.status, "credential refused; refreshing");
                    self.credentials.force_refresh(&credential).await?;
                    refreshed = true;
                    last_failure = failure;
                }
                AttemptOutcome::Rejected(failure) | AttemptOutcome::Fatal(failure) => {
                    warn!(%url, attempt, status = ?failure.status, "upstream fetch rejected");
                    return Err(failure.into_error(url));
                }
                AttemptOutcome::Retryable(failure) if attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        %url,
                        attempt,
                        status = ?failure.status,
                        reason = %failure.message,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "upstream fetch failed; retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    last_failure = failure;
                }
                AttemptOutcome::Retryable(failure) => {
                    last_failure = failure;
                }
            }
        }

        error!(%url, attempts = max_attempts, status = ?last_failure.status, "upstream fetch exhausted retries");
        Err(last_failure.into_error(url))
    }
}
