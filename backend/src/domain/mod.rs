//! Domain primitives, services, and ports.
//!
//! Purpose: authenticate against the upstream service, fetch its resources
//! with bounded retries, canonicalise their shapes, and derive ranked views.
//! Nothing here knows about HTTP frameworks or reqwest; adapters plug in
//! through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic API error payload.
//! - CredentialCache / Credential: cached upstream bearer credential.
//! - ResilientFetcher / RetryPolicy: authenticated GET with retries.
//! - normalize / decode_*: payload shape canonicalisation.
//! - GraphAggregator: top users, trending posts, and feed views.

pub mod activity;
pub mod aggregator;
pub mod credential_cache;
pub mod error;
pub mod fetcher;
pub mod normalizer;
pub mod ports;
pub mod service_identity;
pub mod trace_id;
pub mod upstream_error;

pub use self::activity::{
    AggregateView, Branch, CommentRecord, DegradedBranch, FeedOrder, IdentityRecord,
    PostActivity, PostRecord, UserActivity, compare_ids,
};
pub use self::aggregator::{EndpointError, GraphAggregator, UpstreamEndpoints};
pub use self::credential_cache::{Credential, CredentialCache};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fetcher::{
    BackoffStrategy, LinearBackoff, ResilientFetcher, RetryPolicy, RetrySleeper, TokioSleeper,
};
pub use self::normalizer::{
    ResourceKind, decode_comments, decode_identities, decode_posts, normalize,
};
pub use self::service_identity::ServiceIdentity;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::upstream_error::UpstreamError;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::invalid_request("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
