use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use thiserror::Error;
use tracing::debug;

use crate::config::join_url;
use crate::form::messages::NETWORK_FAILURE;
use crate::outcome::{classify, RelayOutcome};
use crate::upload::UploadRequest;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Network(reqwest::Error),

    #[error("Failed to encode upload: {0}")]
    Encode(reqwest::Error),
}

impl TransportError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err)
        }
    }

    /// Text for the failure outcome shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Timeout => "The request timed out. Please try again.".to_string(),
            TransportError::Network(_) => NETWORK_FAILURE.to_string(),
            TransportError::Encode(e) => format!("Could not prepare the upload: {e}"),
        }
    }
}

/// Sends one submission and reports how it ended.
///
/// Error statuses are not transport errors: they come back as
/// `RelayOutcome::Failure` so the backend's message reaches the user.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send(&self, request: &UploadRequest) -> Result<RelayOutcome, TransportError>;
}

/// Where submissions go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Through the relay at `<origin>/api/upload`, which re-validates.
    Relay(String),
    /// Straight to the backend at `<api base>/upload`.
    Direct(String),
}

impl Endpoint {
    pub fn upload_url(&self) -> String {
        match self {
            Endpoint::Relay(origin) => join_url(origin, "/api/upload"),
            Endpoint::Direct(base) => join_url(base, "/upload"),
        }
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    upload_url: String,
}

impl HttpTransport {
    pub fn new(endpoint: &Endpoint, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Network)?;

        Ok(Self {
            client,
            upload_url: endpoint.upload_url(),
        })
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn send(&self, request: &UploadRequest) -> Result<RelayOutcome, TransportError> {
        let form = request.to_multipart().map_err(TransportError::Encode)?;

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(TransportError::from_transport)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(TransportError::from_transport)?;

        debug!(status, url = %self.upload_url, "Upload answered");

        Ok(classify(
            status,
            content_type.as_deref(),
            body,
            &request.file.download_filename(),
        ))
    }
}
