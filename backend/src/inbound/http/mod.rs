//! HTTP inbound adapter exposing the aggregate views and upstream
//! passthroughs.

pub mod error;
pub mod health;
pub mod posts;
pub mod state;
#[cfg(test)]
pub mod test_utils;
mod upstream_errors;
pub mod users;
pub mod views;

pub use error::ApiResult;

use actix_web::web;

/// Register every API handler on `cfg`.
///
/// Health probes are registered separately because they carry their own
/// state.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::inbound::http::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(users::top_users)
        .service(users::user_posts)
        .service(posts::list_posts)
        .service(posts::post_comments);
}
