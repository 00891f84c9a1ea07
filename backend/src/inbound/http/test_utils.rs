//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::{App, web};
use chrono::{DateTime, TimeZone, Utc};

use crate::Trace;
use crate::domain::ports::MockActivityQuery;
use crate::domain::{AggregateView, Branch, DegradedBranch, PostActivity, UserActivity};
use crate::inbound::http::configure;
use crate::inbound::http::state::HttpState;

pub const TEST_TOP_USERS_LIMIT: usize = 5;

/// App serving every API route against `activity`, wrapped in [`Trace`].
pub fn test_app(
    activity: MockActivityQuery,
    expose_details: bool,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(Arc::new(activity), TEST_TOP_USERS_LIMIT, expose_details);
    App::new()
        .wrap(Trace)
        .app_data(web::Data::new(state))
        .configure(configure)
}

pub fn observed_at() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single() {
        Some(value) => value,
        None => panic!("fixture timestamp"),
    }
}

pub fn user(id: &str, name: &str, comment_count: u64) -> UserActivity {
    UserActivity {
        id: id.to_owned(),
        name: name.to_owned(),
        comment_count,
    }
}

pub fn post(id: &str, author_id: &str, comment_count: u64) -> PostActivity {
    PostActivity {
        id: id.to_owned(),
        author_id: author_id.to_owned(),
        author_name: format!("author {author_id}"),
        body: format!("post {id}"),
        comment_count,
        observed_at: observed_at(),
    }
}

pub fn view<T>(items: Vec<T>) -> AggregateView<T> {
    AggregateView {
        items,
        degraded: Vec::new(),
    }
}

pub fn degraded_comments(post_id: &str) -> DegradedBranch {
    DegradedBranch {
        branch: Branch::PostComments {
            post_id: post_id.to_owned(),
        },
        reason: "upstream fetch failed".to_owned(),
    }
}
