//! Reqwest-backed upstream transport.
//!
//! This adapter owns transport details only: headers, timeout, and mapping
//! reqwest failures. Status codes are handed to the domain untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header};

use super::dto::AuthRequestDto;
use crate::domain::ServiceIdentity;
use crate::domain::ports::{UpstreamReply, UpstreamTransport, UpstreamTransportError};

/// Default `User-Agent` sent upstream.
pub const DEFAULT_USER_AGENT: &str = concat!("pulse-backend/", env!("CARGO_PKG_VERSION"));

/// Upstream transport that performs real HTTP requests.
pub struct ReqwestUpstreamTransport {
    client: Client,
}

impl ReqwestUpstreamTransport {
    /// Build a transport with a request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn into_reply(
        response: reqwest::Response,
    ) -> Result<UpstreamReply, UpstreamTransportError> {
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(UpstreamReply {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestUpstreamTransport {
    async fn authenticate(
        &self,
        url: &Url,
        identity: &ServiceIdentity,
    ) -> Result<UpstreamReply, UpstreamTransportError> {
        let response = self
            .client
            .post(url.clone())
            .header(header::ACCEPT, "application/json")
            .json(&AuthRequestDto::from(identity))
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::into_reply(response).await
    }

    async fn get(
        &self,
        url: &Url,
        authorization: &str,
    ) -> Result<UpstreamReply, UpstreamTransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(map_transport_error)?;
        Self::into_reply(response).await
    }
}

fn map_transport_error(error: reqwest::Error) -> UpstreamTransportError {
    // reqwest error text includes the URL but never headers.
    if error.is_timeout() {
        UpstreamTransportError::timeout(error.to_string())
    } else {
        UpstreamTransportError::transport(error.to_string())
    }
}
