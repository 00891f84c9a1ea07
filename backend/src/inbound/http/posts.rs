//! Posts API handlers.
//!
//! ```text
//! GET /posts?type=popular     Posts tied for the most comments
//! GET /posts?type=latest      Every post, most recently observed first
//! GET /posts/{id}/comments    Normalised comments of one post
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::IntoParams;

use crate::domain::{Error, FeedOrder, PostActivity};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::upstream_errors::map_upstream_error;
use crate::inbound::http::views::view_response;

/// Query string for `GET /posts`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostsQuery {
    /// `popular` (default) or `latest`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Which posts view to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostsView {
    #[default]
    Popular,
    Latest,
}

impl FromStr for PostsView {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "popular" => Ok(Self::Popular),
            "latest" => Ok(Self::Latest),
            other => Err(Error::invalid_request("type must be popular or latest")
                .with_details(json!({ "field": "type", "value": other }))),
        }
    }
}

impl PostsQuery {
    fn view(&self) -> Result<PostsView, Error> {
        self.kind
            .as_deref()
            .map_or(Ok(PostsView::default()), PostsView::from_str)
    }
}

/// Trending posts or the activity feed.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostsQuery),
    responses(
        (status = 200, description = "Posts view", body = [PostActivity],
            headers(("Degraded-Branches" = u32, description = "Sub-fetches counted as zero"))),
        (status = 400, description = "Unknown view type", body = Error),
        (status = 500, description = "Upstream fetch failed", body = Error),
        (status = 502, description = "Upstream denied access", body = Error)
    ),
    tags = ["posts"],
    operation_id = "listPosts"
)]
#[get("/posts")]
pub async fn list_posts(
    state: web::Data<HttpState>,
    query: web::Query<PostsQuery>,
) -> ApiResult<HttpResponse> {
    let view = match query.view()? {
        PostsView::Popular => state.activity.trending_posts().await,
        PostsView::Latest => state.activity.feed(FeedOrder::Latest).await,
    }
    .map_err(|error| map_upstream_error(&error, state.expose_details))?;
    Ok(view_response(&view))
}

/// Comments on one post, in upstream's canonical array form.
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    params(("id" = String, Path, description = "Upstream post identifier")),
    responses(
        (status = 200, description = "Comments of the post", body = [Object]),
        (status = 404, description = "Unknown post", body = Error),
        (status = 500, description = "Upstream fetch failed", body = Error),
        (status = 502, description = "Upstream denied access", body = Error)
    ),
    tags = ["posts"],
    operation_id = "postComments"
)]
#[get("/posts/{id}/comments")]
pub async fn post_comments(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Value>> {
    let post_id = path.into_inner();
    let comments = state
        .activity
        .post_comments(&post_id)
        .await
        .map_err(|error| map_upstream_error(&error, state.expose_details))?;
    Ok(web::Json(comments))
}

#[cfg(test)]
mod tests;
