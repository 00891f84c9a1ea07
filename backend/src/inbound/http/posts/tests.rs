//! Tests for the posts handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use super::{PostsQuery, PostsView};
use crate::domain::ports::MockActivityQuery;
use crate::domain::{ErrorCode, FeedOrder, ResourceKind, UpstreamError};
use crate::inbound::http::test_utils::{degraded_comments, post, test_app, view};
use crate::inbound::http::views::DEGRADED_BRANCHES_HEADER;

async fn get(activity: MockActivityQuery, uri: &str) -> actix_web::dev::ServiceResponse {
    let app = actix_test::init_service(test_app(activity, false)).await;
    actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await
}

fn ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .map(|items| items.iter().filter_map(|item| item["id"].as_str()).collect())
        .unwrap_or_default()
}

#[rstest]
#[case(None, Ok(PostsView::Popular))]
#[case(Some("popular"), Ok(PostsView::Popular))]
#[case(Some("latest"), Ok(PostsView::Latest))]
#[case(Some("Latest"), Err(ErrorCode::InvalidRequest))]
#[case(Some(""), Err(ErrorCode::InvalidRequest))]
fn query_type_selects_view(
    #[case] kind: Option<&str>,
    #[case] expected: Result<PostsView, ErrorCode>,
) {
    let query = PostsQuery {
        kind: kind.map(str::to_owned),
    };
    assert_eq!(query.view().map_err(|error| error.code()), expected);
}

#[rstest]
#[case("/posts")]
#[case("/posts?type=popular")]
#[actix_web::test]
async fn popular_returns_trending_posts(#[case] uri: &str) {
    let mut activity = MockActivityQuery::new();
    activity
        .expect_trending_posts()
        .times(1)
        .returning(|| Ok(view(vec![post("5", "2", 5), post("7", "1", 5)])));
    activity.expect_feed().never();

    let res = get(activity, uri).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(ids(&body), vec!["5", "7"]);
    assert_eq!(body[0]["authorName"], "author 2");
    assert_eq!(body[0]["commentCount"], 5);
}

#[rstest]
#[actix_web::test]
async fn latest_returns_feed_with_degraded_count() {
    let mut activity = MockActivityQuery::new();
    activity
        .expect_feed()
        .with(eq(FeedOrder::Latest))
        .times(1)
        .returning(|_| {
            let mut partial = view(vec![post("30", "3", 0), post("20", "2", 3)]);
            partial.degraded = vec![degraded_comments("30")];
            Ok(partial)
        });
    activity.expect_trending_posts().never();

    let res = get(activity, "/posts?type=latest").await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get(DEGRADED_BRANCHES_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some("1")
    );
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(ids(&body), vec!["30", "20"]);
}

#[rstest]
#[actix_web::test]
async fn unknown_type_is_rejected_without_upstream_calls() {
    let mut activity = MockActivityQuery::new();
    activity.expect_trending_posts().never();
    activity.expect_feed().never();

    let res = get(activity, "/posts?type=oldest").await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"], json!({ "field": "type", "value": "oldest" }));
}

#[rstest]
#[actix_web::test]
async fn malformed_root_payload_is_internal_error() {
    let mut activity = MockActivityQuery::new();
    activity
        .expect_trending_posts()
        .returning(|| Err(UpstreamError::format(ResourceKind::Identities, "number")));

    let res = get(activity, "/posts").await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[rstest]
#[actix_web::test]
async fn post_comments_passes_canonical_array_through() {
    let mut activity = MockActivityQuery::new();
    activity
        .expect_post_comments()
        .withf(|post_id| post_id == "150")
        .times(1)
        .returning(|_| Ok(json!([{ "id": 3893, "postid": 150, "content": "Old comment" }])));

    let res = get(activity, "/posts/150/comments").await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body[0]["content"], "Old comment");
}

#[rstest]
#[actix_web::test]
async fn post_comments_denial_is_bad_gateway() {
    let mut activity = MockActivityQuery::new();
    activity.expect_post_comments().returning(|_| {
        Err(UpstreamError::fetch(
            "http://upstream.test/posts/1/comments",
            403_u16,
            "forbidden",
        ))
    });

    let res = get(activity, "/posts/1/comments").await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}
