//! Scripted upstream transport and a builder for small social graphs.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;
use url::Url;

use crate::domain::ServiceIdentity;
use crate::domain::ports::{UpstreamReply, UpstreamTransport, UpstreamTransportError};

/// Base URL used by scripted upstream fixtures.
pub const TEST_BASE_URL: &str = "http://upstream.test/";

pub type ScriptedResult = Result<UpstreamReply, UpstreamTransportError>;

pub fn test_base_url() -> Url {
    match Url::parse(TEST_BASE_URL) {
        Ok(url) => url,
        Err(error) => panic!("fixture base url: {error}"),
    }
}

pub fn test_identity() -> ServiceIdentity {
    ServiceIdentity {
        email: "ops@pulse.test".to_owned(),
        name: "Pulse".to_owned(),
        roll_no: "42".to_owned(),
        access_code: "access".to_owned(),
        client_id: "client".to_owned(),
        client_secret: "secret".to_owned(),
    }
}

/// Successful auth reply carrying `token` with a relative lifetime.
pub fn token_reply(token: &str, expires_in: i64) -> ScriptedResult {
    Ok(UpstreamReply::json(
        200,
        &json!({ "access_token": token, "token_type": "Bearer", "expires_in": expires_in }),
    ))
}

pub fn status_reply(status: u16) -> ScriptedResult {
    Ok(UpstreamReply::json(status, &json!({ "message": "scripted" })))
}

/// One recorded `GET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedGet {
    pub path: String,
    pub authorization: String,
}

/// Replies are consumed front to back; the last one repeats.
#[derive(Default)]
struct Script(VecDeque<ScriptedResult>);

impl Script {
    fn next(&mut self) -> Option<ScriptedResult> {
        if self.0.len() > 1 {
            self.0.pop_front()
        } else {
            self.0.front().cloned()
        }
    }
}

/// Upstream double keyed by URL path.
///
/// Unscripted paths answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    auth: Mutex<Script>,
    routes: Mutex<HashMap<String, Script>>,
    auth_calls: AtomicUsize,
    requests: Mutex<Vec<RecordedGet>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    auth_gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Auth answers with `token` (valid for an hour) on every call.
    pub fn with_token(self, token: &str) -> Self {
        self.with_auth_replies(vec![token_reply(token, 3_600)])
    }

    pub fn with_auth_replies(self, replies: Vec<ScriptedResult>) -> Self {
        *lock(&self.auth) = Script(replies.into());
        self
    }

    /// Auth calls block until `gate` is notified.
    pub fn with_auth_gate(mut self, gate: Arc<Notify>) -> Self {
        self.auth_gate = Some(gate);
        self
    }

    pub fn with_route(self, path: &str, reply: ScriptedResult) -> Self {
        self.with_route_sequence(path, vec![reply])
    }

    pub fn with_json(self, path: &str, body: Value) -> Self {
        self.with_route(path, Ok(UpstreamReply::json(200, &body)))
    }

    /// Replace the script for `path`.
    pub fn with_route_sequence(self, path: &str, replies: Vec<ScriptedResult>) -> Self {
        lock(&self.routes).insert(path.to_owned(), Script(replies.into()));
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    /// Highest number of `GET`s observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedGet> {
        lock(&self.requests).clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|request| request.path == path)
            .count()
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn authenticate(
        &self,
        _url: &Url,
        _identity: &ServiceIdentity,
    ) -> Result<UpstreamReply, UpstreamTransportError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.auth_gate {
            gate.notified().await;
        }
        let next = lock(&self.auth).next();
        next.unwrap_or_else(|| Err(UpstreamTransportError::transport("no scripted auth reply")))
    }

    async fn get(
        &self,
        url: &Url,
        authorization: &str,
    ) -> Result<UpstreamReply, UpstreamTransportError> {
        let path = url.path().to_owned();
        lock(&self.requests).push(RecordedGet {
            path: path.clone(),
            authorization: authorization.to_owned(),
        });
        let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(active, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = lock(&self.routes).get_mut(&path).and_then(Script::next);
        next.unwrap_or_else(|| status_reply(404))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("scripted transport mutex"),
    }
}

/// Builder for a users → posts → comments graph served in upstream's
/// heterogeneous shapes: users as an id → name map, posts and comments
/// wrapped under their resource key.
#[derive(Default)]
pub struct SocialGraph {
    users: Vec<(String, String)>,
    posts: BTreeMap<String, Vec<String>>,
    comments: HashMap<String, usize>,
}

impl SocialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, id: &str, name: &str) -> Self {
        self.users.push((id.to_owned(), name.to_owned()));
        self.posts.entry(id.to_owned()).or_default();
        self
    }

    /// Add a post by `user_id` carrying `comments` comments.
    pub fn post(mut self, user_id: &str, post_id: &str, comments: usize) -> Self {
        self.posts
            .entry(user_id.to_owned())
            .or_default()
            .push(post_id.to_owned());
        self.comments.insert(post_id.to_owned(), comments);
        self
    }

    /// Scripted transport serving the graph, authenticating with `token-1`.
    pub fn into_transport(self) -> ScriptedTransport {
        let users = self
            .users
            .iter()
            .map(|(id, name)| (id.clone(), Value::String(name.clone())))
            .collect::<serde_json::Map<_, _>>();
        let mut transport = ScriptedTransport::new()
            .with_token("token-1")
            .with_json("/users", json!({ "users": users }));

        for (user_id, post_ids) in &self.posts {
            let posts = post_ids
                .iter()
                .map(|post_id| {
                    json!({ "id": post_id, "userid": user_id, "content": format!("post {post_id}") })
                })
                .collect::<Vec<_>>();
            transport = transport.with_json(
                &format!("/users/{user_id}/posts"),
                json!({ "posts": posts }),
            );
        }

        for (post_id, count) in &self.comments {
            let comments = (0..*count)
                .map(|index| {
                    json!({ "id": format!("{post_id}-{index}"), "postid": post_id, "content": "nice" })
                })
                .collect::<Vec<_>>();
            transport = transport.with_json(
                &format!("/posts/{post_id}/comments"),
                json!({ "comments": comments }),
            );
        }

        transport
    }
}
