//! HTTP transport for signed object store calls

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::canonical::SigningMethod;
use super::signer::SignedRequest;

/// Status and body of a completed call. Any status, including 4xx/5xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The call never produced a response (connect failure, timeout, ...)
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Issues a signed request. Implementations must not treat non-2xx
/// statuses as errors; the driver interprets them.
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    async fn send(
        &self,
        request: SignedRequest,
        body: Bytes,
    ) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with a per-attempt timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client whose every request is bounded by `attempt_timeout`
    pub fn new(attempt_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("carlot-media/", env!("CARGO_PKG_VERSION")))
            .timeout(attempt_timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<SigningMethod> for reqwest::Method {
    fn from(method: SigningMethod) -> Self {
        match method {
            SigningMethod::Put => reqwest::Method::PUT,
            SigningMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl ObjectTransport for ReqwestTransport {
    async fn send(
        &self,
        request: SignedRequest,
        body: Bytes,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method == SigningMethod::Put {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(TransportResponse { status, body })
    }
}
