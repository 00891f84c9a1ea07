//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use backend::domain::ports::ActivityQuery;
use backend::inbound::http::state::HttpState;
use backend::settings::ServerSettings;

/// Everything `create_server` needs besides the health state.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: HttpState,
}

impl ServerConfig {
    /// Combine validated server settings with the activity query port.
    #[must_use]
    pub fn new(settings: &ServerSettings, activity: Arc<dyn ActivityQuery>) -> Self {
        Self {
            bind_addr: settings.bind_addr,
            http_state: HttpState::new(
                activity,
                settings.top_users_limit,
                settings.environment.exposes_error_details(),
            ),
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
