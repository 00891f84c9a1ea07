//! Translate upstream failures into API errors.

use serde_json::json;
use tracing::{error, warn};

use crate::domain::{Error, UpstreamError};

/// Map `error` onto the API taxonomy.
///
/// The upstream error text is attached as `details.upstream` only when
/// `expose_details` is set.
pub(crate) fn map_upstream_error(error: &UpstreamError, expose_details: bool) -> Error {
    let mapped = if error.is_denial() {
        warn!(%error, "upstream denied access");
        Error::upstream_denied("upstream service denied access")
    } else if matches!(error, UpstreamError::Fetch { last_status: Some(404), .. }) {
        warn!(%error, "upstream resource not found");
        Error::not_found("upstream resource not found")
    } else {
        error!(%error, "failed to fetch data from upstream");
        Error::internal("failed to fetch data from upstream")
    };

    if expose_details {
        mapped.with_details(json!({ "upstream": error.to_string() }))
    } else {
        mapped
    }
}
