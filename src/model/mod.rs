use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AttachmentWarning;

/// Readiness of a derived rendition on the origin asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenditionState {
    NotRequested,
    Preparing,
    Ready,
    Errored,
}

/// Derived rendition kinds the pipeline can wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionKind {
    /// Audio-only extract of the asset (the dubbing source payload)
    AudioOnly,
}

impl RenditionKind {
    /// Wire identifier used when requesting the rendition
    pub fn as_str(&self) -> &'static str {
        match self {
            RenditionKind::AudioOnly => "audio_only",
        }
    }

    /// File name of the rendition under the asset's playback prefix
    pub fn file_name(&self) -> &'static str {
        match self {
            RenditionKind::AudioOnly => "audio.m4a",
        }
    }
}

/// Playback access policy of the origin asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPolicy {
    Public,
    Signed,
}

/// A track already attached to the origin asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetTrack {
    /// Track identifier assigned by the origin service
    pub id: String,

    /// Track type ("audio", "text", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// BCP-47 language code if the track carries one
    pub language_code: Option<String>,

    /// Human-readable track name
    pub name: Option<String>,
}

/// Origin asset as reported by the asset service
///
/// Owned by the origin system; the pipeline only reads it and occasionally
/// triggers rendition creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAsset {
    /// Asset identifier
    pub id: String,

    /// Readiness of the audio-only rendition
    #[serde(default = "default_rendition_state")]
    pub audio_rendition: RenditionState,

    /// Asset duration in seconds
    pub duration_secs: Option<f64>,

    /// Tracks currently attached to the asset
    #[serde(default)]
    pub tracks: Vec<AssetTrack>,

    /// Playback access policy
    #[serde(default = "default_playback_policy")]
    pub playback_policy: PlaybackPolicy,

    /// Playback identifier used to address renditions
    pub playback_id: Option<String>,
}

fn default_rendition_state() -> RenditionState {
    RenditionState::NotRequested
}

fn default_playback_policy() -> PlaybackPolicy {
    PlaybackPolicy::Public
}

/// Status of an external dubbing job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Whether no further transitions can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "submitted"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// External dubbing job as observed via polling
///
/// Created by job submission and mutated only by the external processor;
/// the pipeline never writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformJob {
    /// Job identifier assigned by the processor
    pub id: String,

    /// Requested target language code
    pub target_language: String,

    /// Requested speaker count, if constrained
    pub speaker_count: Option<u32>,

    /// Last observed status
    pub status: JobStatus,

    /// Variant identifiers produced by the job (one per output language)
    #[serde(default)]
    pub variants: Vec<String>,

    /// Failure detail reported by the processor
    pub failure_reason: Option<String>,
}

/// Parameters for a new dubbing job
#[derive(Debug, Clone)]
pub struct JobParams {
    /// Target language code
    pub target_language: String,

    /// Number of speakers in the source audio, if known
    pub speaker_count: Option<u32>,
}

/// Opaque binary artifact moving through the pipeline
///
/// Transient by contract: lives only in memory between the download and
/// upload steps, never persisted by the pipeline itself.
#[derive(Debug, Clone)]
pub struct ArtifactBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ArtifactBlob {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Artifact uploaded to object storage with a time-limited retrieval URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Bucket the object was written to
    pub bucket: String,

    /// Object key
    pub key: String,

    /// Presigned retrieval URL
    pub url: String,

    /// Expiry of the presigned URL, fixed at minting
    pub expires_at: DateTime<Utc>,
}

/// Final record returned by the pipeline
///
/// Constructed once and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Origin asset the pipeline ran against
    pub asset_id: String,

    /// Resolved target language code
    pub target_language: String,

    /// External dubbing job identifier
    pub job_id: String,

    /// Track created on the origin asset, when attachment succeeded
    pub attached_track_id: Option<String>,

    /// Presigned retrieval URL for the dubbed artifact (absent in
    /// upload-disabled mode)
    pub presigned_url: Option<String>,

    /// Expiry of the presigned URL
    pub url_expires_at: Option<DateTime<Utc>>,

    /// Timestamp when the pipeline finished
    pub completed_at: DateTime<Utc>,
}

/// Pipeline outcome with the attachment degradation visible in the type
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Every stage succeeded
    Complete(PipelineResult),

    /// The pipeline produced a usable artifact but could not attach it to
    /// the origin asset; the caller can attach manually via the URL
    Degraded {
        result: PipelineResult,
        warning: AttachmentWarning,
    },
}

impl PipelineOutcome {
    /// The result record regardless of degradation
    pub fn result(&self) -> &PipelineResult {
        match self {
            PipelineOutcome::Complete(result) => result,
            PipelineOutcome::Degraded { result, .. } => result,
        }
    }

    /// The attachment warning, if the outcome is degraded
    pub fn warning(&self) -> Option<&AttachmentWarning> {
        match self {
            PipelineOutcome::Complete(_) => None,
            PipelineOutcome::Degraded { warning, .. } => Some(warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_rendition_state_wire_format() {
        let state: RenditionState = serde_json::from_str("\"not_requested\"").unwrap();
        assert_eq!(state, RenditionState::NotRequested);
        assert_eq!(serde_json::to_string(&RenditionState::Ready).unwrap(), "\"ready\"");
    }

    #[test]
    fn test_asset_defaults() {
        let asset: SourceAsset = serde_json::from_str(r#"{"id": "asset-1"}"#).unwrap();
        assert_eq!(asset.audio_rendition, RenditionState::NotRequested);
        assert_eq!(asset.playback_policy, PlaybackPolicy::Public);
        assert!(asset.tracks.is_empty());
    }
}
