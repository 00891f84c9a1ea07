//! Derived views over the upstream social graph.
//!
//! [`GraphAggregator`] walks users → posts → comments through the
//! [`ResilientFetcher`] and ranks the result. Views are rebuilt from upstream
//! on every call; the only shared state is the credential cache behind the
//! fetcher.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use tracing::info;
use url::Url;

use super::activity::{
    AggregateView, DegradedBranch, FeedOrder, IdentityRecord, PostActivity, PostRecord,
    UserActivity,
};
use super::fetcher::ResilientFetcher;
use super::normalizer::{ResourceKind, decode_comments, decode_identities, decode_posts, normalize};
use super::ports::ActivityQuery;
use super::upstream_error::UpstreamError;

mod endpoints;
mod ranking;
mod traversal;

pub use endpoints::{EndpointError, UpstreamEndpoints};
use traversal::AuthoredPosts;

/// Builder of the top-users, trending, and feed views.
pub struct GraphAggregator {
    fetcher: Arc<ResilientFetcher>,
    endpoints: UpstreamEndpoints,
    clock: Arc<dyn Clock>,
    fan_out: usize,
}

impl GraphAggregator {
    /// Default number of concurrent sub-fetches per phase.
    pub const DEFAULT_FAN_OUT: usize = 6;

    /// Build an aggregator with the default fan-out.
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        endpoints: UpstreamEndpoints,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            clock,
            fan_out: Self::DEFAULT_FAN_OUT,
        }
    }

    /// Override the per-phase concurrency bound (clamped to at least one).
    #[must_use]
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out.max(1);
        self
    }

    async fn fetch_canonical(&self, url: Url, kind: ResourceKind) -> Result<Value, UpstreamError> {
        let raw = self.fetcher.fetch(&url).await?;
        normalize(raw, kind)
    }

    async fn identities(&self) -> Result<Vec<IdentityRecord>, UpstreamError> {
        let canonical = self
            .fetch_canonical(self.endpoints.users(), ResourceKind::Identities)
            .await?;
        decode_identities(&canonical)
    }

    async fn posts_of(&self, user_id: &str) -> Result<Vec<PostRecord>, UpstreamError> {
        let canonical = self
            .fetch_canonical(self.endpoints.user_posts(user_id), ResourceKind::Posts)
            .await?;
        decode_posts(&canonical)
    }

    async fn comment_count(&self, post_id: &str) -> Result<u64, UpstreamError> {
        let canonical = self
            .fetch_canonical(self.endpoints.post_comments(post_id), ResourceKind::Comments)
            .await?;
        let comments = decode_comments(&canonical, post_id)?;
        Ok(u64::try_from(comments.len()).unwrap_or(u64::MAX))
    }

    /// Users, their posts, and every post's comment count.
    async fn enriched_posts(
        &self,
        degraded: &mut Vec<DegradedBranch>,
    ) -> Result<Vec<PostActivity>, UpstreamError> {
        let users = self.identities().await?;
        let authored = self.collect_posts(users, degraded).await?;
        let post_ids = authored
            .iter()
            .flat_map(|entry| entry.posts.iter().map(|post| post.id.clone()))
            .collect::<Vec<_>>();
        let mut counts = self.count_comments(&post_ids, degraded).await?.into_iter();

        let mut activity = Vec::with_capacity(post_ids.len());
        for AuthoredPosts {
            author,
            posts,
            observed_at,
        } in authored
        {
            for post in posts {
                activity.push(PostActivity {
                    author_id: post.author_id.unwrap_or_else(|| author.id.clone()),
                    author_name: author.name.clone(),
                    id: post.id,
                    body: post.body,
                    comment_count: counts.next().unwrap_or_default(),
                    observed_at,
                });
            }
        }
        Ok(activity)
    }
}

fn finish<T>(view: &str, items: Vec<T>, degraded: Vec<DegradedBranch>) -> AggregateView<T> {
    info!(
        view,
        items = items.len(),
        degraded = degraded.len(),
        "aggregate view built"
    );
    AggregateView { items, degraded }
}

#[async_trait]
impl ActivityQuery for GraphAggregator {
    async fn top_users(&self, limit: usize) -> Result<AggregateView<UserActivity>, UpstreamError> {
        let mut degraded = Vec::new();
        let users = self.identities().await?;
        let authored = self.collect_posts(users, &mut degraded).await?;
        let post_ids = authored
            .iter()
            .flat_map(|entry| entry.posts.iter().map(|post| post.id.clone()))
            .collect::<Vec<_>>();
        let mut counts = self.count_comments(&post_ids, &mut degraded).await?.into_iter();

        let totals = authored
            .into_iter()
            .map(|entry| {
                let comment_count = entry
                    .posts
                    .iter()
                    .map(|_| counts.next().unwrap_or_default())
                    .sum();
                UserActivity {
                    id: entry.author.id.clone(),
                    name: entry.author.name.clone(),
                    comment_count,
                }
            })
            .collect();

        Ok(finish(
            "top_users",
            ranking::rank_users(totals, limit),
            degraded,
        ))
    }

    async fn trending_posts(&self) -> Result<AggregateView<PostActivity>, UpstreamError> {
        let mut degraded = Vec::new();
        let posts = self.enriched_posts(&mut degraded).await?;
        Ok(finish(
            "trending_posts",
            ranking::most_commented(posts),
            degraded,
        ))
    }

    async fn feed(&self, order: FeedOrder) -> Result<AggregateView<PostActivity>, UpstreamError> {
        let mut degraded = Vec::new();
        let posts = self.enriched_posts(&mut degraded).await?;
        let items = match order {
            FeedOrder::Latest => ranking::latest_first(posts),
        };
        Ok(finish("feed", items, degraded))
    }

    async fn user_posts(&self, user_id: &str) -> Result<Value, UpstreamError> {
        self.fetch_canonical(self.endpoints.user_posts(user_id), ResourceKind::Posts)
            .await
    }

    async fn post_comments(&self, post_id: &str) -> Result<Value, UpstreamError> {
        self.fetch_canonical(self.endpoints.post_comments(post_id), ResourceKind::Comments)
            .await
    }
}

#[cfg(test)]
mod tests;
