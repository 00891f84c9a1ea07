//! Unit tests for view aggregation over a scripted upstream.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::{GraphAggregator, UpstreamEndpoints};
use crate::domain::activity::{Branch, FeedOrder};
use crate::domain::fetcher::{ResilientFetcher, RetryPolicy};
use crate::domain::ports::ActivityQuery;
use crate::domain::upstream_error::UpstreamError;
use crate::domain::CredentialCache;
use crate::test_support::clock::{ImmediateSleeper, MutableClock};
use crate::test_support::upstream::{
    ScriptedTransport, SocialGraph, status_reply, test_base_url, test_identity,
};

struct Harness {
    transport: Arc<ScriptedTransport>,
    aggregator: GraphAggregator,
}

fn harness_with_fan_out(transport: ScriptedTransport, fan_out: usize) -> Harness {
    let transport = Arc::new(transport);
    let clock = Arc::new(MutableClock::default());
    let endpoints = UpstreamEndpoints::new(test_base_url()).expect("valid base");
    let credentials = Arc::new(CredentialCache::new(
        transport.clone(),
        clock.clone(),
        test_identity(),
        endpoints.auth(),
    ));
    let fetcher = Arc::new(ResilientFetcher::with_sleeper(
        transport.clone(),
        credentials,
        RetryPolicy::default(),
        Arc::new(ImmediateSleeper),
    ));
    let aggregator = GraphAggregator::new(fetcher, endpoints, clock).with_fan_out(fan_out);
    Harness {
        transport,
        aggregator,
    }
}

fn harness(transport: ScriptedTransport) -> Harness {
    harness_with_fan_out(transport, GraphAggregator::DEFAULT_FAN_OUT)
}

/// Ada: 3 + 2 comments, Bo: 3, Cy: 5.
#[fixture]
fn three_users() -> SocialGraph {
    SocialGraph::new()
        .user("1", "Ada")
        .user("2", "Bo")
        .user("3", "Cy")
        .post("1", "10", 3)
        .post("1", "11", 2)
        .post("2", "20", 3)
        .post("3", "30", 5)
}

#[rstest]
#[tokio::test]
async fn top_users_break_ties_by_ascending_id(three_users: SocialGraph) {
    let h = harness(three_users.into_transport());

    let view = h.aggregator.top_users(2).await.expect("view");

    let ranked = view
        .items
        .iter()
        .map(|user| (user.id.as_str(), user.comment_count))
        .collect::<Vec<_>>();
    assert_eq!(ranked, vec![("1", 5), ("3", 5)]);
    assert!(!view.is_degraded());
}

#[rstest]
#[tokio::test]
async fn users_without_posts_rank_with_zero(three_users: SocialGraph) {
    let h = harness(three_users.user("4", "Di").into_transport());

    let view = h.aggregator.top_users(10).await.expect("view");

    assert_eq!(view.items.len(), 4);
    let last = view.items.last().expect("last user");
    assert_eq!((last.id.as_str(), last.comment_count), ("4", 0));
}

#[rstest]
#[tokio::test]
async fn trending_returns_every_post_tied_for_most_comments() {
    let graph = SocialGraph::new()
        .user("1", "Ada")
        .user("2", "Bo")
        .post("1", "4", 2)
        .post("1", "7", 5)
        .post("2", "5", 5)
        .post("2", "6", 1);
    let h = harness(graph.into_transport());

    let view = h.aggregator.trending_posts().await.expect("view");

    let trending = view
        .items
        .iter()
        .map(|post| (post.id.as_str(), post.author_name.as_str(), post.comment_count))
        .collect::<Vec<_>>();
    assert_eq!(trending, vec![("5", "Bo", 5), ("7", "Ada", 5)]);
}

#[rstest]
#[tokio::test]
async fn failing_comment_branch_counts_as_zero_and_is_reported(three_users: SocialGraph) {
    let transport = three_users
        .into_transport()
        .with_route("/posts/30/comments", status_reply(500));
    let h = harness(transport);

    let view = h.aggregator.top_users(5).await.expect("partial view");

    let cy = view
        .items
        .iter()
        .find(|user| user.id == "3")
        .expect("Cy still ranked");
    assert_eq!(cy.comment_count, 0);
    assert_eq!(view.degraded.len(), 1);
    assert_eq!(
        view.degraded[0].branch,
        Branch::PostComments {
            post_id: "30".to_owned()
        }
    );
    assert_eq!(h.transport.requests_to("/posts/30/comments"), 3);
}

#[rstest]
#[tokio::test]
async fn failing_comment_branch_drops_out_of_trending(three_users: SocialGraph) {
    let transport = three_users
        .into_transport()
        .with_route("/posts/30/comments", status_reply(500));
    let h = harness(transport);

    let view = h.aggregator.trending_posts().await.expect("partial view");

    let trending = view
        .items
        .iter()
        .map(|post| (post.id.as_str(), post.comment_count))
        .collect::<Vec<_>>();
    assert_eq!(trending, vec![("10", 3), ("20", 3)]);
    assert_eq!(view.degraded.len(), 1);
    assert_eq!(
        view.degraded[0].branch,
        Branch::PostComments {
            post_id: "30".to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn malformed_posts_branch_is_degraded_not_fatal(three_users: SocialGraph) {
    let transport = three_users
        .into_transport()
        .with_json("/users/2/posts", json!("not posts"));
    let h = harness(transport);

    let view = h.aggregator.trending_posts().await.expect("partial view");

    assert_eq!(
        view.degraded[0].branch,
        Branch::UserPosts {
            user_id: "2".to_owned()
        }
    );
    assert!(view.degraded[0].reason.contains("unrecognised posts payload"));
    assert!(view.items.iter().all(|post| post.author_id != "2"));
}

#[rstest]
#[tokio::test]
async fn no_users_yield_empty_views() {
    let h = harness(SocialGraph::new().into_transport());

    let top = h.aggregator.top_users(5).await.expect("view");
    let trending = h.aggregator.trending_posts().await.expect("view");
    let feed = h.aggregator.feed(FeedOrder::Latest).await.expect("view");

    assert!(top.items.is_empty());
    assert!(trending.items.is_empty());
    assert!(feed.items.is_empty());
    assert!(h.transport.requests().iter().all(|request| request.path == "/users"));
}

#[rstest]
#[tokio::test]
async fn users_with_no_posts_have_no_trending_posts() {
    let graph = SocialGraph::new().user("1", "Ada").user("2", "Bo");
    let h = harness(graph.into_transport());

    let view = h.aggregator.trending_posts().await.expect("view");

    assert!(view.items.is_empty());
    assert!(!view.is_degraded());
}

#[rstest]
#[tokio::test]
async fn root_fetch_failure_propagates(three_users: SocialGraph) {
    let transport = three_users
        .into_transport()
        .with_route("/users", status_reply(503));
    let h = harness(transport);

    let error = h.aggregator.top_users(5).await.expect_err("root failed");

    assert!(matches!(
        error,
        UpstreamError::Fetch {
            last_status: Some(503),
            ..
        }
    ));
}

#[rstest]
#[tokio::test]
async fn authentication_failure_propagates(three_users: SocialGraph) {
    let transport = three_users
        .into_transport()
        .with_auth_replies(vec![status_reply(403)]);
    let h = harness(transport);

    let error = h.aggregator.feed(FeedOrder::Latest).await.expect_err("auth failed");

    assert!(error.is_denial());
    assert!(h.transport.requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn feed_with_equal_observations_lists_later_traversal_first(three_users: SocialGraph) {
    let h = harness(three_users.into_transport());

    let view = h.aggregator.feed(FeedOrder::Latest).await.expect("view");

    let ids = view
        .items
        .iter()
        .map(|post| post.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["30", "20", "11", "10"]);
    assert_eq!(view.items[0].comment_count, 5);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[tokio::test]
async fn fan_out_bounds_concurrent_requests(#[case] fan_out: usize) {
    let graph = (1..=8).fold(SocialGraph::new(), |graph, id| {
        let id = id.to_string();
        graph
            .user(&id, "someone")
            .post(&id, &format!("{id}00"), 1)
    });
    let h = harness_with_fan_out(graph.into_transport(), fan_out);

    let view = h.aggregator.top_users(8).await.expect("view");

    assert_eq!(view.items.len(), 8);
    assert!(h.transport.max_in_flight() <= fan_out);
}

#[rstest]
#[tokio::test]
async fn passthroughs_return_canonical_arrays(three_users: SocialGraph) {
    let h = harness(three_users.into_transport());

    let posts = h.aggregator.user_posts("2").await.expect("posts");
    let comments = h.aggregator.post_comments("11").await.expect("comments");

    assert_eq!(
        posts,
        json!([{ "id": "20", "userid": "2", "content": "post 20" }])
    );
    assert_eq!(comments.as_array().map(Vec::len), Some(2));
}

#[rstest]
#[tokio::test]
async fn passthrough_failures_propagate(three_users: SocialGraph) {
    let h = harness(three_users.into_transport());

    let error = h.aggregator.user_posts("99").await.expect_err("unknown user");

    assert!(matches!(
        error,
        UpstreamError::Fetch {
            last_status: Some(404),
            ..
        }
    ));
}
