use std::time::Duration;

use async_trait::async_trait;

use crate::model::{ArtifactBlob, JobParams, RenditionKind, SourceAsset, TransformJob};
use crate::retry::Retryable;

pub mod origin;
pub mod processor;
pub mod signer;
pub mod store;

/// Failure reported by a remote collaborator
#[derive(thiserror::Error, Debug, Clone)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ServiceError::Auth(message),
            404 => ServiceError::NotFound(message),
            _ => ServiceError::Http { status, message },
        }
    }
}

impl Retryable for ServiceError {
    /// Network/timeout failures and server-side errors are worth another
    /// attempt; auth and validation rejections are not.
    fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout(_) => true,
            ServiceError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout(err.to_string())
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

/// Map a non-2xx response to a [`ServiceError`], passing 2xx through
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ServiceError::http(status.as_u16(), message))
}

/// Origin asset service: owns the source asset and its renditions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OriginAssetService: Send + Sync {
    /// Fetch the current state of an asset
    async fn get_asset(&self, asset_id: &str) -> Result<SourceAsset, ServiceError>;

    /// Request creation of a derived rendition.
    ///
    /// Idempotent at the remote: an "already requested" conflict is treated
    /// as success.
    async fn request_rendition(
        &self,
        asset_id: &str,
        kind: RenditionKind,
    ) -> Result<(), ServiceError>;

    /// Download the bytes of a ready rendition, honoring the asset's
    /// playback policy
    async fn fetch_rendition(
        &self,
        asset: &SourceAsset,
        kind: RenditionKind,
    ) -> Result<ArtifactBlob, ServiceError>;

    /// Register a new track on the asset, returning its id
    async fn create_track(&self, asset_id: &str, track: NewTrack) -> Result<String, ServiceError>;
}

/// Track registration payload for the origin service
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewTrack {
    #[serde(rename = "type")]
    pub kind: String,
    pub language_code: String,
    pub name: String,
    pub url: String,
}

/// External long-running job processor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Submit a payload for processing and return the job id.
    ///
    /// Non-2xx responses are fatal here; retry policy belongs to the caller.
    async fn submit_job(
        &self,
        payload: ArtifactBlob,
        params: &JobParams,
    ) -> Result<String, ServiceError>;

    /// Fetch the current job record
    async fn get_job(&self, job_id: &str) -> Result<TransformJob, ServiceError>;

    /// Download the bytes of a produced variant
    async fn download_variant(
        &self,
        job_id: &str,
        variant: &str,
    ) -> Result<ArtifactBlob, ServiceError>;
}

/// S3-compatible object store bound to a single bucket
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store writes to
    fn bucket(&self) -> &str;

    /// Upload an object
    async fn put_object(&self, key: &str, blob: ArtifactBlob) -> Result<(), ServiceError>;

    /// Mint a presigned GET URL valid for `ttl` from now
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, ServiceError>;
}

/// Signs playback URLs when the origin asset's policy requires it
pub trait UrlSigner: Send + Sync {
    fn sign_url(
        &self,
        base_url: &str,
        asset_id: &str,
        ttl: Duration,
    ) -> Result<String, ServiceError>;
}
