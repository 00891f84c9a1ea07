//! Driving port for the aggregate activity views.
//!
//! HTTP handlers depend on this trait rather than on the aggregator so they
//! can be tested against `MockActivityQuery`.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::activity::{AggregateView, FeedOrder, PostActivity, UserActivity};
use crate::domain::upstream_error::UpstreamError;

/// Read-only queries over the upstream social graph.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityQuery: Send + Sync {
    /// Users ranked by comments received, at most `limit`.
    async fn top_users(&self, limit: usize) -> Result<AggregateView<UserActivity>, UpstreamError>;

    /// Posts tied for the most comments.
    async fn trending_posts(&self) -> Result<AggregateView<PostActivity>, UpstreamError>;

    /// All posts in feed order.
    async fn feed(&self, order: FeedOrder) -> Result<AggregateView<PostActivity>, UpstreamError>;

    /// Canonical post array for one user.
    async fn user_posts(&self, user_id: &str) -> Result<Value, UpstreamError>;

    /// Canonical comment array for one post.
    async fn post_comments(&self, post_id: &str) -> Result<Value, UpstreamError>;
}
