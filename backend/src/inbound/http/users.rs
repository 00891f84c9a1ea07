//! Users API handlers.
//!
//! ```text
//! GET /users              Top users by comments received
//! GET /users/{id}/posts   Normalised posts of one user
//! ```

use actix_web::{HttpResponse, get, web};
use serde_json::Value;

use crate::domain::{Error, UserActivity};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::upstream_errors::map_upstream_error;
use crate::inbound::http::views::view_response;

/// Users ranked by the number of comments on their posts.
///
/// Ties are broken by ascending user id. At most the configured limit is
/// returned.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Top users", body = [UserActivity],
            headers(("Degraded-Branches" = u32, description = "Sub-fetches counted as zero"))),
        (status = 500, description = "Upstream fetch failed", body = Error),
        (status = 502, description = "Upstream denied access", body = Error)
    ),
    tags = ["users"],
    operation_id = "topUsers"
)]
#[get("/users")]
pub async fn top_users(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let view = state
        .activity
        .top_users(state.top_users_limit)
        .await
        .map_err(|error| map_upstream_error(&error, state.expose_details))?;
    Ok(view_response(&view))
}

/// Posts authored by one user, in upstream's canonical array form.
#[utoipa::path(
    get,
    path = "/users/{id}/posts",
    params(("id" = String, Path, description = "Upstream user identifier")),
    responses(
        (status = 200, description = "Posts of the user", body = [Object]),
        (status = 404, description = "Unknown user", body = Error),
        (status = 500, description = "Upstream fetch failed", body = Error),
        (status = 502, description = "Upstream denied access", body = Error)
    ),
    tags = ["users"],
    operation_id = "userPosts"
)]
#[get("/users/{id}/posts")]
pub async fn user_posts(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Value>> {
    let user_id = path.into_inner();
    let posts = state
        .activity
        .user_posts(&user_id)
        .await
        .map_err(|error| map_upstream_error(&error, state.expose_details))?;
    Ok(web::Json(posts))
}
