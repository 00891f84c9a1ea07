//! End-to-end HTTP tests: actix app, aggregator, and a scripted upstream.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use backend::Trace;
use backend::domain::{TRACE_ID_HEADER, UpstreamEndpoints};
use backend::inbound::http::configure;
use backend::inbound::http::state::HttpState;
use backend::inbound::http::views::DEGRADED_BRANCHES_HEADER;
use backend::outbound::upstream::UpstreamStack;
use backend::settings::UpstreamConfig;
use backend::test_support::clock::{ImmediateSleeper, MutableClock};
use backend::test_support::upstream::{
    ScriptedTransport, SocialGraph, status_reply, test_base_url, test_identity,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

fn state(transport: ScriptedTransport, expose_details: bool) -> HttpState {
    let config = UpstreamConfig {
        endpoints: UpstreamEndpoints::new(test_base_url()).expect("valid base"),
        identity: test_identity(),
        max_attempts: 2,
        retry_base_delay: Duration::from_millis(1),
        token_safety_margin: Duration::from_secs(300),
        fan_out: 4,
        request_timeout: Duration::from_secs(1),
        user_agent: "http-endpoints".to_owned(),
    };
    let stack = UpstreamStack::with_transport(
        &config,
        Arc::new(transport),
        Arc::new(MutableClock::default()),
        Arc::new(ImmediateSleeper),
    );
    HttpState::new(Arc::new(stack.aggregator()), 2, expose_details)
}

async fn get(state: HttpState, uri: &str) -> (StatusCode, Option<String>, Value) {
    let app = test::init_service(
        App::new()
            .wrap(Trace)
            .app_data(web::Data::new(state))
            .configure(configure),
    )
    .await;
    let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = res.status();
    let degraded = res
        .headers()
        .get(DEGRADED_BRANCHES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
    let body = test::read_body_json(res).await;
    (status, degraded, body)
}

#[fixture]
fn graph() -> SocialGraph {
    SocialGraph::new()
        .user("1", "Ada")
        .user("2", "Bo")
        .user("3", "Cy")
        .post("1", "10", 2)
        .post("2", "20", 6)
        .post("3", "30", 6)
}

#[rstest]
#[actix_web::test]
async fn top_users_respects_limit_and_tie_order(graph: SocialGraph) {
    let (status, degraded, body) = get(state(graph.into_transport(), false), "/users").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(degraded.as_deref(), Some("0"));
    assert_eq!(
        body,
        json!([
            { "id": "2", "name": "Bo", "commentCount": 6 },
            { "id": "3", "name": "Cy", "commentCount": 6 }
        ])
    );
}

#[rstest]
#[actix_web::test]
async fn popular_lists_every_tied_post(graph: SocialGraph) {
    let (status, _, body) = get(state(graph.into_transport(), false), "/posts?type=popular").await;

    assert_eq!(status, StatusCode::OK);
    let ids = body
        .as_array()
        .expect("array")
        .iter()
        .map(|post| post["id"].as_str().unwrap_or_default().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["20", "30"]);
}

#[rstest]
#[actix_web::test]
async fn latest_feed_reports_degraded_branches(graph: SocialGraph) {
    let transport = graph
        .into_transport()
        .with_route("/posts/10/comments", status_reply(500));

    let (status, degraded, body) = get(state(transport, false), "/posts?type=latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(degraded.as_deref(), Some("1"));
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[rstest]
#[actix_web::test]
async fn invalid_type_is_bad_request(graph: SocialGraph) {
    let (status, _, body) = get(state(graph.into_transport(), false), "/posts?type=top").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn denied_authentication_is_bad_gateway(graph: SocialGraph) {
    let transport = graph
        .into_transport()
        .with_auth_replies(vec![status_reply(403)]);

    let (status, _, body) = get(state(transport, true), "/users").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "upstream_denied");
    assert!(
        body["details"]["upstream"]
            .as_str()
            .is_some_and(|text| text.contains("status 403"))
    );
}

#[rstest]
#[actix_web::test]
async fn passthrough_returns_normalised_comments(graph: SocialGraph) {
    let (status, degraded, body) =
        get(state(graph.into_transport(), false), "/posts/20/comments").await;

    assert_eq!(status, StatusCode::OK);
    assert!(degraded.is_none());
    assert_eq!(body.as_array().map(Vec::len), Some(6));
    assert_eq!(body[0]["postid"], "20");
}
