//! Driven port for raw HTTP exchanges with the upstream service.
//!
//! The domain owns the request and reply shapes so retry, credential, and
//! normalisation logic stay adapter-agnostic. Adapters only move bytes: they
//! never interpret status codes.

use async_trait::async_trait;
use url::Url;

use super::define_port_error;
use crate::domain::ServiceIdentity;

/// Raw upstream reply: status code plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl UpstreamReply {
    /// Build a reply from a status and JSON value.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::ports::UpstreamReply;
    /// use serde_json::json;
    ///
    /// let reply = UpstreamReply::json(200, &json!([]));
    /// assert!(reply.is_success());
    /// ```
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Whether upstream refused the credential (401/403).
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Compact, length-bounded preview of the body for error messages.
    #[must_use]
    pub fn body_preview(&self) -> String {
        const PREVIEW_CHAR_LIMIT: usize = 160;

        let compact = String::from_utf8_lossy(&self.body)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
        if compact.chars().count() > PREVIEW_CHAR_LIMIT {
            format!("{preview}...")
        } else {
            preview
        }
    }
}

define_port_error! {
    /// Errors raised when no HTTP response was received at all.
    pub enum UpstreamTransportError {
        /// Connection, DNS, TLS, or body read failure.
        Transport { message: String } =>
            "upstream transport failed: {message}",
        /// Request exceeded the configured timeout.
        Timeout { message: String } =>
            "upstream request timed out: {message}",
    }
}

/// Port for sending requests to the upstream service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// POST the service identity to the authentication endpoint.
    async fn authenticate(
        &self,
        url: &Url,
        identity: &ServiceIdentity,
    ) -> Result<UpstreamReply, UpstreamTransportError>;

    /// GET a resource with the given `Authorization` header value.
    async fn get(
        &self,
        url: &Url,
        authorization: &str,
    ) -> Result<UpstreamReply, UpstreamTransportError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for reply helpers.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, true, false, false)]
    #[case(204, true, false, false)]
    #[case(401, false, false, true)]
    #[case(403, false, false, true)]
    #[case(404, false, false, false)]
    #[case(503, false, true, false)]
    fn classifies_statuses(
        #[case] status: u16,
        #[case] success: bool,
        #[case] server_error: bool,
        #[case] rejection: bool,
    ) {
        let reply = UpstreamReply {
            status,
            body: Vec::new(),
        };
        assert_eq!(reply.is_success(), success);
        assert_eq!(reply.is_server_error(), server_error);
        assert_eq!(reply.is_auth_rejection(), rejection);
    }

    #[test]
    fn body_preview_compacts_and_truncates() {
        let reply = UpstreamReply {
            status: 500,
            body: format!("  oops \n {}", "x".repeat(400)).into_bytes(),
        };
        let preview = reply.body_preview();
        assert!(preview.starts_with("oops x"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }
}
