//! Cached upstream bearer credential with a single-flight refresh path.
//!
//! The cache is the only state shared between concurrent aggregation
//! requests. Refreshing happens while holding an async mutex, so callers that
//! arrive during a refresh wait for its outcome instead of authenticating
//! again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroize;

use super::ServiceIdentity;
use super::ports::{UpstreamReply, UpstreamTransport};
use super::upstream_error::UpstreamError;

/// Default credential lifetime when upstream omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3_600;
/// `expires_in` values above this are absolute Unix timestamps, not offsets.
const ABSOLUTE_EXPIRY_THRESHOLD: i64 = 1_000_000_000;
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Upstream bearer credential.
///
/// The token is wiped from memory on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    token_type: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from its parts.
    pub fn new(
        token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            token_type: token_type.into(),
            expires_at,
        }
    }

    /// Raw access token.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    /// Scheme used in the `Authorization` header, `Bearer` unless upstream
    /// says otherwise.
    #[must_use]
    pub fn token_type(&self) -> &str {
        self.token_type.as_str()
    }

    /// Instant after which the cache stops handing this credential out.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `Authorization` header value: `{token_type} {access_token}`.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Credential;
    /// use chrono::Utc;
    ///
    /// let credential = Credential::new("abc", "Bearer", Utc::now());
    /// assert_eq!(credential.authorization(), "Bearer abc");
    /// ```
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }

    /// Whether the credential may still be used at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

#[derive(Deserialize)]
struct AuthGrant {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<Value>,
}

/// Owner of the upstream credential.
pub struct CredentialCache {
    transport: Arc<dyn UpstreamTransport>,
    clock: Arc<dyn Clock>,
    identity: ServiceIdentity,
    auth_url: Url,
    safety_margin: Duration,
    slot: Mutex<Option<Credential>>,
}

impl CredentialCache {
    /// Default margin subtracted from the issued lifetime.
    pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(300);

    /// Build an empty cache that authenticates against `auth_url`.
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        clock: Arc<dyn Clock>,
        identity: ServiceIdentity,
        auth_url: Url,
    ) -> Self {
        Self {
            transport,
            clock,
            identity,
            auth_url,
            safety_margin: Self::DEFAULT_SAFETY_MARGIN,
            slot: Mutex::new(None),
        }
    }

    /// Override the margin subtracted from the issued lifetime.
    #[must_use]
    pub fn with_safety_margin(mut self, safety_margin: Duration) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    /// Return a fresh credential, authenticating only when the cached one is
    /// missing or expired.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Auth`] when authentication fails. The cached
    /// state is left untouched in that case.
    pub async fn get_token(&self) -> Result<Credential, UpstreamError> {
        let mut slot = self.slot.lock().await;
        if let Some(credential) = slot
            .as_ref()
            .filter(|credential| credential.is_fresh_at(self.clock.utc()))
        {
            debug!("reusing cached upstream credential");
            return Ok(credential.clone());
        }

        let fresh = self.authenticate().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    /// Replace a credential upstream has rejected.
    ///
    /// When another caller already swapped `rejected` for a newer credential
    /// that one is returned without authenticating again.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Auth`] when authentication fails.
    pub async fn force_refresh(&self, rejected: &Credential) -> Result<Credential, UpstreamError> {
        let mut slot = self.slot.lock().await;
        if let Some(current) = slot.as_ref().filter(|current| {
            current.token() != rejected.token() && current.is_fresh_at(self.clock.utc())
        }) {
            debug!("credential already replaced by a concurrent refresh");
            return Ok(current.clone());
        }

        let fresh = self.authenticate().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    async fn authenticate(&self) -> Result<Credential, UpstreamError> {
        info!(url = %self.auth_url, "requesting upstream credential");
        let reply = self
            .transport
            .authenticate(&self.auth_url, &self.identity)
            .await
            .map_err(|error| {
                warn!(%error, "upstream authentication transport failed");
                UpstreamError::auth(error.to_string(), None::<u16>)
            })?;

        if !reply.is_success() {
            warn!(status = reply.status, "upstream rejected authentication");
            return Err(UpstreamError::auth(
                format!("status {}: {}", reply.status, reply.body_preview()),
                reply.status,
            ));
        }

        let credential = self.credential_from_reply(&reply)?;
        info!(expires_at = %credential.expires_at, "upstream credential refreshed");
        Ok(credential)
    }

    fn credential_from_reply(&self, reply: &UpstreamReply) -> Result<Credential, UpstreamError> {
        let grant: AuthGrant = serde_json::from_slice(&reply.body).map_err(|error| {
            UpstreamError::auth(format!("malformed auth payload: {error}"), reply.status)
        })?;
        let token = grant
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| UpstreamError::auth("auth payload has no access_token", reply.status))?;
        let token_type = grant
            .token_type
            .filter(|kind| !kind.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned());

        let now = self.clock.utc();
        let lifetime = issued_lifetime(grant.expires_in.as_ref(), now);
        let margin = TimeDelta::from_std(self.safety_margin).unwrap_or(TimeDelta::MAX);
        let usable = lifetime
            .checked_sub(&margin)
            .unwrap_or_else(TimeDelta::zero)
            .max(TimeDelta::zero());

        Ok(Credential::new(token, token_type, now + usable))
    }
}

fn issued_lifetime(expires_in: Option<&Value>, now: DateTime<Utc>) -> TimeDelta {
    let seconds = match expires_in {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    match seconds {
        Some(absolute) if absolute > ABSOLUTE_EXPIRY_THRESHOLD => {
            DateTime::from_timestamp(absolute, 0)
                .map_or_else(TimeDelta::zero, |expires_at| expires_at - now)
        }
        Some(relative) => TimeDelta::try_seconds(relative).unwrap_or_else(TimeDelta::zero),
        None => TimeDelta::seconds(DEFAULT_LIFETIME_SECS),
    }
}
