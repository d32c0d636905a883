use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::domain::ClassificationResult;
use thiserror::Error;
use url::Url;

pub mod controller;
pub mod preview;

pub use controller::{ErrorKind, RequestState, UploadController};
pub use preview::PreviewHandle;

/// Multipart field name the classifier endpoint expects the binary under.
pub const UPLOAD_FIELD: &str = "image";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One user-selected file, owned for the duration of a single
/// classification attempt and replaced on the next selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub content: Vec<u8>,
    pub media_type: String,
    pub file_name: String,
}

impl UploadedFile {
    pub fn new(
        content: Vec<u8>,
        media_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            content,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("selected file type {media_type:?} is not an image")]
    InvalidFileType { media_type: String },
    #[error("classification request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("classifier endpoint returned {status}: {body}")]
    RemoteService { status: u16, body: String },
    #[error("classifier response was not a valid result: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// Seam between the upload controller and the network. Production code
/// uses [`PredictionClient`]; tests script their own implementation.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, file: &UploadedFile) -> Result<ClassificationResult, ClassifyError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Issues a single multipart POST per classification attempt against the
/// configured endpoint. No retries, no caching; overlapping calls are the
/// caller's problem (the controller supersedes them).
pub struct PredictionClient {
    http: Client,
    endpoint: Url,
}

impl PredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClassifyError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for PredictionClient {
    async fn classify(&self, file: &UploadedFile) -> Result<ClassificationResult, ClassifyError> {
        let part = Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.media_type)
            .map_err(ClassifyError::Network)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClassifyError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(ClassifyError::MalformedResponse)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
