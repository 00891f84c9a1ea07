//! Outcome of a single upstream `GET`.

use serde_json::Value;

use crate::domain::ports::{UpstreamReply, UpstreamTransportError};
use crate::domain::upstream_error::UpstreamError;

/// Status and message of the most recent failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct AttemptFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl AttemptFailure {
    pub fn into_error(self, url: &url::Url) -> UpstreamError {
        UpstreamError::fetch(url.as_str(), self.status, self.message)
    }
}

pub(super) enum AttemptOutcome {
    Success(Value),
    /// 401/403: the credential was refused.
    Rejected(AttemptFailure),
    /// Transport error, 5xx, or an unusable 2xx body.
    Retryable(AttemptFailure),
    /// Any other non-2xx status.
    Fatal(AttemptFailure),
}

impl AttemptOutcome {
    pub fn classify(result: Result<UpstreamReply, UpstreamTransportError>) -> Self {
        let reply = match result {
            Ok(reply) => reply,
            Err(error) => {
                return Self::Retryable(AttemptFailure {
                    status: None,
                    message: error.to_string(),
                });
            }
        };

        let failure = |message: String| AttemptFailure {
            status: Some(reply.status),
            message,
        };

        if reply.is_success() {
            if reply.body.iter().all(u8::is_ascii_whitespace) {
                return Self::Retryable(failure("empty response body".to_owned()));
            }
            return match serde_json::from_slice::<Value>(&reply.body) {
                Ok(value) => Self::Success(value),
                Err(error) => Self::Retryable(failure(format!("invalid JSON body: {error}"))),
            };
        }

        let described = failure(format!("status {}: {}", reply.status, reply.body_preview()));
        if reply.is_auth_rejection() {
            Self::Rejected(described)
        } else if reply.is_server_error() {
            Self::Retryable(described)
        } else {
            Self::Fatal(described)
        }
    }
}
