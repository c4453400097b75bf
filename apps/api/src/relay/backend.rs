//! Backend client: the only place the relay talks to the resume-processing service.
//!
//! One outbound POST per call. No retries here: retry is a user action on the client.
use reqwest::{header::CONTENT_TYPE, Client};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::outcome::{classify, RelayOutcome};
use crate::upload::UploadRequest;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend call timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Network(reqwest::Error),

    #[error("Failed to encode upload: {0}")]
    Encode(reqwest::Error),
}

impl BackendError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(err)
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    upload_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(BackendError::Network)?;

        Ok(Self {
            client,
            upload_url: config.backend_upload_url(),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Forwards the upload and classifies the backend's reply.
    /// Error statuses and unreadable bodies come back as `RelayOutcome::Failure`;
    /// `Err` means no usable response arrived.
    pub async fn forward(&self, request: &UploadRequest) -> Result<RelayOutcome, BackendError> {
        let form = request.to_multipart().map_err(BackendError::Encode)?;

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(BackendError::from_transport)?;

        debug!(
            status,
            content_type = content_type.as_deref().unwrap_or("none"),
            bytes = body.len(),
            "Backend responded"
        );

        Ok(classify(
            status,
            content_type.as_deref(),
            body,
            &request.file.attachment_filename(),
        ))
    }
}
