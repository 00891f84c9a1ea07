//! Upstream REST service adapters.
//!
//! A thin reqwest implementation of the `UpstreamTransport` port plus the
//! assembly of the domain services that sit on top of it, and a connectivity
//! probe over that assembly.

mod dto;
mod http_transport;
mod probe;
mod stack;

pub use http_transport::{DEFAULT_USER_AGENT, ReqwestUpstreamTransport};
pub use probe::{ProbeReport, probe};
pub use stack::UpstreamStack;
