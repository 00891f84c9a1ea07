//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the [`ActivityQuery`] port and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::ActivityQuery;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Aggregate views and passthroughs over the upstream graph.
    pub activity: Arc<dyn ActivityQuery>,
    /// Maximum number of users returned by `GET /users`.
    pub top_users_limit: usize,
    /// Attach upstream error text to error responses.
    pub expose_details: bool,
}

impl HttpState {
    /// Construct state from the query port and response settings.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    /// use backend::domain::ports::ActivityQuery;
    /// use backend::inbound::http::state::HttpState;
    ///
    /// fn build(activity: Arc<dyn ActivityQuery>) -> HttpState {
    ///     HttpState::new(activity, 5, false)
    /// }
    /// ```
    pub fn new(activity: Arc<dyn ActivityQuery>, top_users_limit: usize, expose_details: bool) -> Self {
        Self {
            activity,
            top_users_limit,
            expose_details,
        }
    }
}
