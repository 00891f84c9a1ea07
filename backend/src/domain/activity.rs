//! Request-scoped activity entities and the derived view envelope.
//!
//! Records (`IdentityRecord`, `PostRecord`, `CommentRecord`) are the typed
//! form of normalised upstream payloads. `UserActivity` and `PostActivity` are
//! what the aggregator hands back to callers; both are immutable once built.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical `{id, name}` identity of an upstream user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityRecord {
    /// Upstream user identifier.
    pub id: String,
    /// Display name supplied by upstream.
    pub name: String,
}

/// One post as returned by `GET /users/{id}/posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Upstream post identifier.
    pub id: String,
    /// Author id when upstream supplies one.
    pub author_id: Option<String>,
    /// Post text (`content` or `body`).
    pub body: String,
}

/// One comment as returned by `GET /posts/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    /// Upstream comment identifier.
    pub id: String,
    /// Post the comment belongs to.
    pub post_id: String,
    /// Comment author (`name` or `author`).
    pub author: String,
    /// Comment text.
    pub body: String,
}

/// User ranked by the number of comments their posts received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    /// Upstream user identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Total comments across the user's posts.
    pub comment_count: u64,
}

/// Post enriched with author details, comment count, and fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostActivity {
    /// Upstream post identifier.
    pub id: String,
    /// Author identifier.
    pub author_id: String,
    /// Author display name.
    pub author_name: String,
    /// Post text.
    pub body: String,
    /// Number of comments on the post.
    pub comment_count: u64,
    /// Local time the post list containing this post was received.
    ///
    /// Upstream exposes no authoritative timestamp, so this only approximates
    /// recency.
    pub observed_at: DateTime<Utc>,
}

/// Ordering for the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedOrder {
    /// Most recently observed first.
    #[default]
    Latest,
}

/// Sub-fetch that failed during a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Branch {
    /// `GET /users/{id}/posts` for one user.
    UserPosts {
        /// User whose posts were requested.
        user_id: String,
    },
    /// `GET /posts/{id}/comments` for one post.
    PostComments {
        /// Post whose comments were requested.
        post_id: String,
    },
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserPosts { user_id } => write!(f, "posts of user {user_id}"),
            Self::PostComments { post_id } => write!(f, "comments of post {post_id}"),
        }
    }
}

/// A branch that contributed a neutral value instead of aborting the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedBranch {
    /// Which sub-fetch failed.
    pub branch: Branch,
    /// Rendered upstream error.
    pub reason: String,
}

/// Derived view plus the branches that were degraded while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateView<T> {
    /// View entries in their final order.
    pub items: Vec<T>,
    /// Sub-fetches that failed and were counted as zero/empty.
    pub degraded: Vec<DegradedBranch>,
}

impl<T> AggregateView<T> {
    /// View with no entries and no degraded branches.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            degraded: Vec::new(),
        }
    }

    /// Whether any sub-fetch was swallowed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Compare upstream identifiers.
///
/// Ids that both parse as unsigned integers compare numerically; numeric ids
/// sort before non-numeric ones; everything else compares as text.
///
/// # Examples
/// ```
/// use std::cmp::Ordering;
/// use backend::domain::compare_ids;
///
/// assert_eq!(compare_ids("2", "10"), Ordering::Less);
/// assert_eq!(compare_ids("10", "abc"), Ordering::Less);
/// ```
#[must_use]
pub fn compare_ids(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r).then_with(|| left.cmp(right)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left.cmp(right),
    }
}
