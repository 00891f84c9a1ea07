//! Two-phase fan-out over the users → posts → comments graph.
//!
//! Each phase runs at most `fan_out` requests at once and yields results in
//! traversal order, whatever order they complete in. Leaf failures become
//! [`DegradedBranch`] entries; authentication failures abort the traversal.

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::warn;

use super::GraphAggregator;
use crate::domain::activity::{Branch, DegradedBranch, IdentityRecord, PostRecord};
use crate::domain::upstream_error::UpstreamError;

/// Posts of one user, stamped with the instant their list arrived.
pub(super) struct AuthoredPosts {
    pub author: IdentityRecord,
    pub posts: Vec<PostRecord>,
    pub observed_at: DateTime<Utc>,
}

impl GraphAggregator {
    /// Phase one: every user's posts.
    pub(super) async fn collect_posts(
        &self,
        users: Vec<IdentityRecord>,
        degraded: &mut Vec<DegradedBranch>,
    ) -> Result<Vec<AuthoredPosts>, UpstreamError> {
        let results = stream::iter(users)
            .map(|author| async move {
                let fetched = self.posts_of(&author.id).await;
                let observed_at = self.clock.utc();
                (author, fetched, observed_at)
            })
            .buffered(self.fan_out)
            .collect::<Vec<_>>()
            .await;

        let mut authored = Vec::with_capacity(results.len());
        for (author, fetched, observed_at) in results {
            let posts = match fetched {
                Ok(posts) => posts,
                Err(error) => {
                    let branch = Branch::UserPosts {
                        user_id: author.id.clone(),
                    };
                    record_degraded(branch, error, degraded)?;
                    Vec::new()
                }
            };
            authored.push(AuthoredPosts {
                author,
                posts,
                observed_at,
            });
        }
        Ok(authored)
    }

    /// Phase two: comment counts, aligned with `post_ids`.
    pub(super) async fn count_comments(
        &self,
        post_ids: &[String],
        degraded: &mut Vec<DegradedBranch>,
    ) -> Result<Vec<u64>, UpstreamError> {
        let results = stream::iter(post_ids.to_vec())
            .map(|post_id| async move {
                let counted = self.comment_count(&post_id).await;
                (post_id, counted)
            })
            .buffered(self.fan_out)
            .collect::<Vec<_>>()
            .await;

        let mut counts = Vec::with_capacity(results.len());
        for (post_id, counted) in results {
            let count = match counted {
                Ok(count) => count,
                Err(error) => {
                    let branch = Branch::PostComments { post_id };
                    record_degraded(branch, error, degraded)?;
                    0
                }
            };
            counts.push(count);
        }
        Ok(counts)
    }
}

fn record_degraded(
    branch: Branch,
    error: UpstreamError,
    degraded: &mut Vec<DegradedBranch>,
) -> Result<(), UpstreamError> {
    if matches!(error, UpstreamError::Auth { .. }) {
        return Err(error);
    }
    warn!(%branch, %error, "upstream branch failed; counting it as empty");
    degraded.push(DegradedBranch {
        branch,
        reason: error.to_string(),
    });
    Ok(())
}
