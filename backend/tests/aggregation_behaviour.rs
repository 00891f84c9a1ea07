//! Behavioural tests for the upstream stack assembled through the public API.

use std::sync::Arc;
use std::time::Duration;

use backend::domain::ports::{ActivityQuery, UpstreamReply};
use backend::domain::{FeedOrder, UpstreamEndpoints};
use backend::outbound::upstream::UpstreamStack;
use backend::settings::UpstreamConfig;
use backend::test_support::clock::{MutableClock, RecordingSleeper};
use backend::test_support::upstream::{
    ScriptedTransport, SocialGraph, status_reply, test_base_url, test_identity, token_reply,
};
use rstest::{fixture, rstest};
use serde_json::json;

struct World {
    transport: Arc<ScriptedTransport>,
    clock: Arc<MutableClock>,
    sleeper: Arc<RecordingSleeper>,
    stack: UpstreamStack,
}

fn config() -> UpstreamConfig {
    UpstreamConfig {
        endpoints: UpstreamEndpoints::new(test_base_url()).expect("valid base"),
        identity: test_identity(),
        max_attempts: 3,
        retry_base_delay: Duration::from_millis(100),
        token_safety_margin: Duration::from_secs(300),
        fan_out: 3,
        request_timeout: Duration::from_secs(5),
        user_agent: "aggregation-behaviour".to_owned(),
    }
}

fn world(transport: ScriptedTransport) -> World {
    let transport = Arc::new(transport);
    let clock = Arc::new(MutableClock::default());
    let sleeper = Arc::new(RecordingSleeper::default());
    let stack = UpstreamStack::with_transport(
        &config(),
        transport.clone(),
        clock.clone(),
        sleeper.clone(),
    );
    World {
        transport,
        clock,
        sleeper,
        stack,
    }
}

#[fixture]
fn graph() -> SocialGraph {
    SocialGraph::new()
        .user("1", "Ada")
        .user("2", "Bo")
        .post("1", "10", 4)
        .post("2", "20", 1)
}

#[rstest]
#[tokio::test]
async fn aggregators_from_one_stack_share_a_credential(graph: SocialGraph) {
    let w = world(graph.into_transport());

    let top = w.stack.aggregator().top_users(5).await.expect("top users");
    let trending = w.stack.aggregator().trending_posts().await.expect("trending");
    let feed = w.stack.aggregator().feed(FeedOrder::Latest).await.expect("feed");

    assert_eq!(top.items[0].name, "Ada");
    assert_eq!(trending.items.len(), 1);
    assert_eq!(trending.items[0].id, "10");
    assert_eq!(feed.items.len(), 2);
    assert_eq!(w.transport.auth_calls(), 1);
    assert!(
        w.transport
            .requests()
            .iter()
            .all(|request| request.authorization == "Bearer token-1")
    );
}

#[rstest]
#[tokio::test]
async fn expired_credential_is_replaced_before_the_next_view(graph: SocialGraph) {
    let transport = graph
        .into_transport()
        .with_auth_replies(vec![token_reply("token-1", 3_600), token_reply("token-2", 3_600)]);
    let w = world(transport);
    let aggregator = w.stack.aggregator();

    aggregator.top_users(5).await.expect("first view");
    w.clock.advance_seconds(3_301);
    aggregator.top_users(5).await.expect("second view");

    assert_eq!(w.transport.auth_calls(), 2);
    let last = w.transport.requests().pop().expect("requests recorded");
    assert_eq!(last.authorization, "Bearer token-2");
}

#[rstest]
#[tokio::test]
async fn rejected_credential_is_refreshed_once_without_backoff() {
    let users = UpstreamReply::json(200, &json!({ "users": { "1": "Ada" } }));
    let transport = ScriptedTransport::new()
        .with_auth_replies(vec![token_reply("token-1", 3_600), token_reply("token-2", 3_600)])
        .with_route_sequence("/users", vec![status_reply(401), Ok(users)])
        .with_json("/users/1/posts", json!({ "posts": [] }));
    let w = world(transport);

    let view = w.stack.aggregator().top_users(5).await.expect("view");

    assert_eq!(view.items.len(), 1);
    assert_eq!(w.transport.auth_calls(), 2);
    assert!(w.sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test]
async fn flaky_leaf_recovers_within_the_retry_budget(graph: SocialGraph) {
    let comments = UpstreamReply::json(200, &json!({ "comments": [{ "id": "c1", "postid": "20" }] }));
    let transport = graph
        .into_transport()
        .with_route_sequence("/posts/20/comments", vec![status_reply(502), Ok(comments)]);
    let w = world(transport);

    let view = w.stack.aggregator().top_users(5).await.expect("view");

    assert!(!view.is_degraded());
    let bo = view.items.iter().find(|user| user.id == "2").expect("Bo ranked");
    assert_eq!(bo.comment_count, 1);
    assert_eq!(w.sleeper.recorded(), vec![Duration::from_millis(100)]);
}

#[rstest]
#[tokio::test]
async fn exhausted_leaf_degrades_after_linear_backoff(graph: SocialGraph) {
    let transport = graph
        .into_transport()
        .with_route("/posts/10/comments", status_reply(500));
    let w = world(transport);

    let view = w.stack.aggregator().top_users(5).await.expect("partial view");

    assert_eq!(view.degraded.len(), 1);
    assert_eq!(w.transport.requests_to("/posts/10/comments"), 3);
    assert_eq!(
        w.sleeper.recorded(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
}
