use std::time::Duration;

use crate::model::JobStatus;
use crate::services::ServiceError;

/// Errors surfaced by the dubbing pipeline
///
/// Every variant names the failing stage and carries enough context (job id,
/// last observed status, attempt count) to diagnose without re-running.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("audio rendition for asset {asset_id} not ready after {attempts} polls")]
    RenditionTimeout { asset_id: String, attempts: u32 },

    #[error("audio rendition for asset {asset_id} reported errored by the origin service")]
    RenditionErrored { asset_id: String },

    #[error("job submission failed after {attempts} attempt(s): {reason}")]
    Submission { reason: String, attempts: u32 },

    #[error("dubbing job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    #[error("dubbing job {job_id} still {last_status} after {attempts} polls")]
    JobTimeout {
        job_id: String,
        last_status: JobStatus,
        attempts: u32,
    },

    #[error("artifact transfer for job {job_id} failed: {reason}")]
    Transfer { job_id: String, reason: String },

    /// Collaborator failure outside the named cases, tagged with the stage
    #[error("{stage} stage failed: {source}")]
    Service {
        stage: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("pipeline deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Non-fatal attachment failure
///
/// The pipeline still returns the presigned URL; the caller can attach the
/// track manually.
#[derive(thiserror::Error, Debug, Clone)]
#[error("failed to attach track to asset {asset_id}: {reason}")]
pub struct AttachmentWarning {
    pub asset_id: String,
    pub reason: String,
}
