//! Response shaping for aggregate views.

use actix_web::HttpResponse;
use serde::Serialize;

use crate::domain::AggregateView;

/// Response header carrying the number of sub-fetches that were swallowed
/// while building an aggregate view.
pub const DEGRADED_BRANCHES_HEADER: &str = "degraded-branches";

/// `200 OK` with the view's items as a JSON array and the degraded branch
/// count in [`DEGRADED_BRANCHES_HEADER`].
pub(crate) fn view_response<T: Serialize>(view: &AggregateView<T>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((DEGRADED_BRANCHES_HEADER, view.degraded.len().to_string()))
        .json(&view.items)
}
