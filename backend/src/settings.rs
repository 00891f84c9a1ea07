//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `PULSE_*` environment variables, CLI flags, or a config
//! file. [`PulseSettings::validate`] turns the raw, all-optional layer into
//! the typed [`UpstreamConfig`] and [`ServerSettings`] the binaries use.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    CredentialCache, EndpointError, GraphAggregator, RetryPolicy, ServiceIdentity,
    UpstreamEndpoints,
};
use crate::outbound::upstream::DEFAULT_USER_AGENT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_TOP_USERS_LIMIT: usize = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Raw configuration layer.
#[derive(Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PULSE")]
pub struct PulseSettings {
    /// Upstream base URL, e.g. `http://20.244.56.144/evaluation-service`.
    pub base_url: Option<String>,
    /// Registered contact email.
    #[serde(default, deserialize_with = "text_or_number")]
    pub email: Option<String>,
    /// Registered name.
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: Option<String>,
    /// Registration roll number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub roll_no: Option<String>,
    /// Access code issued at registration.
    #[serde(default, deserialize_with = "text_or_number")]
    pub access_code: Option<String>,
    /// Client identifier.
    #[serde(default, deserialize_with = "text_or_number")]
    pub client_id: Option<String>,
    /// Client secret.
    #[serde(default, deserialize_with = "text_or_number")]
    pub client_secret: Option<String>,
    /// Attempts per upstream GET, including the first.
    pub max_attempts: Option<u32>,
    /// Linear backoff step between attempts.
    pub retry_base_delay_ms: Option<u64>,
    /// Seconds subtracted from each issued token lifetime.
    pub token_safety_margin_secs: Option<u64>,
    /// Concurrent sub-fetches per traversal phase.
    pub fan_out: Option<usize>,
    /// Per-request timeout for upstream calls.
    pub request_timeout_secs: Option<u64>,
    /// `User-Agent` sent upstream.
    pub user_agent: Option<String>,
    /// Listen address for the HTTP server.
    pub bind_addr: Option<String>,
    /// Entries returned by `GET /users`.
    pub top_users_limit: Option<usize>,
    /// `development` or `production`.
    pub environment: Option<String>,
}

impl std::fmt::Debug for PulseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("PulseSettings")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("roll_no", &self.roll_no)
            .field("access_code", &redacted(&self.access_code))
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("token_safety_margin_secs", &self.token_safety_margin_secs)
            .field("fan_out", &self.fan_out)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("bind_addr", &self.bind_addr)
            .field("top_users_limit", &self.top_users_limit)
            .field("environment", &self.environment)
            .finish()
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// OrthoConfig could not merge its sources.
    #[error("failed to load configuration: {message}")]
    Load { message: String },
    /// A required value was absent or blank.
    #[error("missing required setting PULSE_{name}")]
    Missing { name: &'static str },
    /// `base_url` did not parse.
    #[error("invalid upstream base url {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },
    /// `base_url` parsed but cannot anchor resource paths.
    #[error(transparent)]
    InvalidEndpoint(#[from] EndpointError),
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value:?}: {reason}")]
    InvalidBindAddr { value: String, reason: String },
    /// `environment` is not a known deployment environment.
    #[error("unknown environment {value:?}; expected development or production")]
    InvalidEnvironment { value: String },
}

/// Deployment environment; production hides upstream error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local and test deployments.
    #[default]
    Development,
    /// Public deployments.
    Production,
}

impl Environment {
    /// Whether error responses may carry upstream error details.
    #[must_use]
    pub fn exposes_error_details(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment {
                value: value.to_owned(),
            }),
        }
    }
}

/// Validated upstream connection settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Resource URL builder rooted at the base URL.
    pub endpoints: UpstreamEndpoints,
    /// Identity exchanged for a bearer token.
    pub identity: ServiceIdentity,
    /// Retry bound and backoff step.
    pub max_attempts: u32,
    /// Linear backoff step.
    pub retry_base_delay: Duration,
    /// Margin subtracted from token lifetimes.
    pub token_safety_margin: Duration,
    /// Concurrent sub-fetches per traversal phase.
    pub fan_out: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl UpstreamConfig {
    /// Retry policy built from the configured bound and step.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_attempts, self.retry_base_delay)
    }
}

/// Validated HTTP server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Entries returned by `GET /users`.
    pub top_users_limit: usize,
    /// Deployment environment.
    pub environment: Environment,
}

impl PulseSettings {
    /// Load settings from CLI arguments, environment, and config files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source cannot be parsed.
    pub fn load_layers() -> Result<Self, ConfigError> {
        Self::load().map_err(|error| ConfigError::Load {
            message: error.to_string(),
        })
    }

    /// Validate the upstream group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing identity fields or an unusable
    /// base URL.
    pub fn upstream(&self) -> Result<UpstreamConfig, ConfigError> {
        let base_url = required(self.base_url.as_ref(), "BASE_URL")?;
        let parsed = Url::parse(base_url.trim()).map_err(|error| ConfigError::InvalidUrl {
            value: base_url.clone(),
            reason: error.to_string(),
        })?;
        let endpoints = UpstreamEndpoints::new(parsed)?;

        let identity = ServiceIdentity {
            email: required(self.email.as_ref(), "EMAIL")?.clone(),
            name: required(self.name.as_ref(), "NAME")?.clone(),
            roll_no: required(self.roll_no.as_ref(), "ROLL_NO")?.clone(),
            access_code: required(self.access_code.as_ref(), "ACCESS_CODE")?.clone(),
            client_id: required(self.client_id.as_ref(), "CLIENT_ID")?.clone(),
            client_secret: required(self.client_secret.as_ref(), "CLIENT_SECRET")?.clone(),
        };

        Ok(UpstreamConfig {
            endpoints,
            identity,
            max_attempts: self
                .max_attempts
                .unwrap_or(RetryPolicy::DEFAULT_MAX_ATTEMPTS)
                .max(1),
            retry_base_delay: self
                .retry_base_delay_ms
                .map_or(RetryPolicy::DEFAULT_BASE_DELAY, Duration::from_millis),
            token_safety_margin: self
                .token_safety_margin_secs
                .map_or(CredentialCache::DEFAULT_SAFETY_MARGIN, Duration::from_secs),
            fan_out: self
                .fan_out
                .unwrap_or(GraphAggregator::DEFAULT_FAN_OUT)
                .max(1),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                    .max(1),
            ),
            user_agent: self
                .user_agent
                .clone()
                .filter(|agent| !agent.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
        })
    }

    /// Validate the server group.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unparsable bind address or unknown
    /// environment.
    pub fn server(&self) -> Result<ServerSettings, ConfigError> {
        let raw_addr = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr =
            raw_addr
                .trim()
                .parse::<SocketAddr>()
                .map_err(|error| ConfigError::InvalidBindAddr {
                    value: raw_addr.to_owned(),
                    reason: error.to_string(),
                })?;
        let environment = self
            .environment
            .as_deref()
            .map(Environment::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(ServerSettings {
            bind_addr,
            top_users_limit: self.top_users_limit.unwrap_or(DEFAULT_TOP_USERS_LIMIT),
            environment,
        })
    }
}

/// Identity values issued at registration are often numeric, and env layers
/// hand them over as integers.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
    }

    Ok(
        Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
            Raw::Text(text) => text,
            Raw::Signed(value) => value.to_string(),
            Raw::Unsigned(value) => value.to_string(),
            Raw::Float(value) => value.to_string(),
        }),
    )
}

fn required<'a>(value: Option<&'a String>, name: &'static str) -> Result<&'a String, ConfigError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing { name })
}
