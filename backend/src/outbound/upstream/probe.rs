//! Step-by-step connectivity check against the upstream service.
//!
//! Authenticates, lists users, then walks the first user's posts and the
//! first post's comments, logging what each step returned. The walk stops
//! quietly when a level is empty.

use tracing::info;

use super::UpstreamStack;
use crate::domain::{
    ResourceKind, UpstreamError, decode_comments, decode_identities, decode_posts, normalize,
};

/// What each probe step observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Token type of the issued credential.
    pub token_type: String,
    /// Users in the normalised identity list.
    pub user_count: usize,
    /// First user by id, if any.
    pub first_user: Option<String>,
    /// Posts of `first_user`; `None` when nobody exists.
    pub post_count: Option<usize>,
    /// First post of `first_user`, if any.
    pub first_post: Option<String>,
    /// Comments on `first_post`; `None` when there is no post to walk.
    pub comment_count: Option<usize>,
}

/// Run every probe step, stopping at the first failure.
///
/// # Errors
///
/// Returns the [`UpstreamError`] of the failing step.
pub async fn probe(stack: &UpstreamStack) -> Result<ProbeReport, UpstreamError> {
    let credential = stack.credentials.get_token().await?;
    let token_type = credential.token_type().to_owned();
    info!(step = "auth", %token_type, expires_at = %credential.expires_at(), "authenticated");

    let users = stack.fetcher.fetch(&stack.endpoints.users()).await?;
    let users = decode_identities(&normalize(users, ResourceKind::Identities)?)?;
    let first_user = users.first().map(|user| user.id.clone());
    info!(step = "users", count = users.len(), first = ?first_user, "listed users");

    let mut report = ProbeReport {
        token_type,
        user_count: users.len(),
        first_user,
        ..ProbeReport::default()
    };
    let Some(user_id) = report.first_user.clone() else {
        return Ok(report);
    };

    let posts = stack.fetcher.fetch(&stack.endpoints.user_posts(&user_id)).await?;
    let posts = decode_posts(&normalize(posts, ResourceKind::Posts)?)?;
    report.post_count = Some(posts.len());
    report.first_post = posts.first().map(|post| post.id.clone());
    info!(step = "posts", user = %user_id, count = posts.len(), first = ?report.first_post, "listed posts");

    let Some(post_id) = report.first_post.clone() else {
        return Ok(report);
    };

    let comments = stack
        .fetcher
        .fetch(&stack.endpoints.post_comments(&post_id))
        .await?;
    let comments = decode_comments(&normalize(comments, ResourceKind::Comments)?, &post_id)?;
    report.comment_count = Some(comments.len());
    info!(step = "comments", post = %post_id, count = comments.len(), "listed comments");

    Ok(report)
}
