//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod activity_query;
mod upstream_transport;

#[cfg(test)]
pub use activity_query::MockActivityQuery;
pub use activity_query::ActivityQuery;
#[cfg(test)]
pub use upstream_transport::MockUpstreamTransport;
pub use upstream_transport::{UpstreamReply, UpstreamTransport, UpstreamTransportError};
