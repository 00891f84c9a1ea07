//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the aggregate views, the upstream passthroughs, and
//! the health probes. Swagger UI serves it in debug builds.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, PostActivity, UserActivity};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pulse backend API",
        description = "Ranked activity views derived from an upstream social graph."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::top_users,
        crate::inbound::http::users::user_posts,
        crate::inbound::http::posts::list_posts,
        crate::inbound::http::posts::post_comments,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(UserActivity, PostActivity, Error, ErrorCode)),
    tags(
        (name = "users", description = "Top users and per-user posts"),
        (name = "posts", description = "Trending posts, the feed, and comments"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
