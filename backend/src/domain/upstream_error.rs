//! Failure taxonomy for the upstream fetch path.

use super::normalizer::ResourceKind;
use super::ports::define_port_error;

define_port_error! {
    /// Errors raised while authenticating against, fetching from, or decoding
    /// the upstream service.
    pub enum UpstreamError {
        /// Upstream rejected the service identity or returned a malformed
        /// auth payload. `status` is absent when no response arrived.
        Auth { message: String, status: Option<u16> } =>
            "upstream authentication failed: {message}",
        /// Retries were exhausted or a non-retryable status was returned.
        Fetch { url: String, last_status: Option<u16>, last_message: String } =>
            "upstream fetch of {url} failed: {last_message}",
        /// Upstream payload shape was not recognised.
        Format { kind: ResourceKind, received: String } =>
            "unrecognised {kind} payload: {received}",
    }
}

impl UpstreamError {
    /// Whether upstream explicitly refused our credentials (401/403).
    ///
    /// # Examples
    /// ```
    /// use backend::domain::UpstreamError;
    ///
    /// assert!(UpstreamError::auth("bad secret", 401_u16).is_denial());
    /// assert!(!UpstreamError::fetch("https://x.invalid/users", 500_u16, "boom").is_denial());
    /// ```
    #[must_use]
    pub fn is_denial(&self) -> bool {
        let status = match self {
            Self::Auth { status, .. } => *status,
            Self::Fetch { last_status, .. } => *last_status,
            Self::Format { .. } => None,
        };
        matches!(status, Some(401 | 403))
    }
}
