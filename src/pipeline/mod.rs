//! The dubbing pipeline orchestrator.
//!
//! Sequences the stages in fixed order: rendition readiness, job
//! submission, job status polling, artifact transfer, and origin
//! attachment. Each stage consumes only the previous stage's typed output;
//! no stage holds hidden state between invocations.
//!
//! Already-created remote side effects (submitted jobs, uploaded objects)
//! are never rolled back on abort.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AttachmentWarning, PipelineError};
use crate::model::{JobParams, PipelineOutcome, PipelineResult, RenditionKind, StoredArtifact};
use crate::retry::{with_retry, RetryConfig};
use crate::services::origin::HttpOriginClient;
use crate::services::processor::HttpJobProcessor;
use crate::services::signer::HmacUrlSigner;
use crate::services::store::S3ObjectStore;
use crate::services::{JobProcessor, NewTrack, ObjectStore, OriginAssetService, UrlSigner};
use crate::utils::{canonical_language_code, track_name};

pub mod readiness;
pub mod status;
pub mod transfer;

use readiness::ReadinessPoller;
use status::JobStatusPoller;
use transfer::ArtifactTransfer;

/// Orchestrator states, visited in declaration order on the happy path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CheckingReadiness,
    Submitting,
    Polling,
    Transferring,
    Attaching,
    Done,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::CheckingReadiness => "checking-readiness",
            PipelineState::Submitting => "submitting",
            PipelineState::Polling => "polling",
            PipelineState::Transferring => "transferring",
            PipelineState::Attaching => "attaching",
            PipelineState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Tunable knobs of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Interval between rendition readiness polls
    pub rendition_poll_interval: Duration,

    /// Maximum rendition readiness polls after the initial fetch
    pub rendition_max_attempts: u32,

    /// Interval between job status polls
    pub job_poll_interval: Duration,

    /// Maximum job status polls
    pub job_max_attempts: u32,

    /// Validity of minted presigned URLs
    pub presign_ttl: Duration,

    /// Object key prefix inside the bucket
    pub key_prefix: String,

    /// Retry policy applied to job submission
    pub retry: RetryConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            rendition_poll_interval: Duration::from_secs(5),
            rendition_max_attempts: 36,
            job_poll_interval: Duration::from_secs(10),
            job_max_attempts: 180,
            presign_ttl: Duration::from_secs(3600),
            key_prefix: "dubbing/".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl From<&Config> for PipelineSettings {
    /// Pipeline knobs come from the `pipeline` section; the object key
    /// prefix lives with the rest of the bucket settings in `store`.
    fn from(config: &Config) -> Self {
        Self {
            rendition_poll_interval: Duration::from_secs(
                config.pipeline.rendition_poll_interval_secs,
            ),
            rendition_max_attempts: config.pipeline.rendition_max_attempts,
            job_poll_interval: Duration::from_secs(config.pipeline.job_poll_interval_secs),
            job_max_attempts: config.pipeline.job_max_attempts,
            presign_ttl: Duration::from_secs(config.pipeline.presign_ttl_secs),
            key_prefix: config.store.key_prefix.clone().unwrap_or_default(),
            retry: RetryConfig {
                max_retries: config.pipeline.retry_max_attempts,
                base_delay: Duration::from_millis(config.pipeline.retry_base_delay_ms),
                max_delay: Duration::from_millis(config.pipeline.retry_max_delay_ms),
            },
        }
    }
}

/// A single dubbing request
#[derive(Debug, Clone)]
pub struct DubRequest {
    /// Origin asset to dub
    pub asset_id: String,

    /// Target language (code or English name, canonicalized internally)
    pub target_language: String,

    /// Number of speakers in the source audio, if known
    pub speaker_count: Option<u32>,

    /// When false, the pipeline stops after the job succeeds and returns
    /// the job id only
    pub upload_enabled: bool,

    /// Overall wall-clock budget for the whole run
    pub deadline: Option<Duration>,
}

impl DubRequest {
    pub fn new(asset_id: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            target_language: target_language.into(),
            speaker_count: None,
            upload_enabled: true,
            deadline: None,
        }
    }
}

/// Sequences the dubbing stages against the injected collaborators
pub struct DubbingPipeline {
    origin: Arc<dyn OriginAssetService>,
    processor: Arc<dyn JobProcessor>,
    store: Arc<dyn ObjectStore>,
    settings: PipelineSettings,
}

impl DubbingPipeline {
    /// Build a pipeline with concrete HTTP/S3 clients from configuration
    pub async fn new(config: &Config) -> Result<Self, PipelineError> {
        config.validate()?;

        let signer: Option<Arc<dyn UrlSigner>> = config
            .origin
            .signing_secret
            .as_ref()
            .map(|secret| Arc::new(HmacUrlSigner::new(secret.clone())) as Arc<dyn UrlSigner>);

        let origin = HttpOriginClient::new(
            config.origin.base_url.as_str(),
            config.origin.media_base_url.as_str(),
            config.origin.token.clone(),
            signer,
        );

        let processor =
            HttpJobProcessor::new(config.processor.base_url.as_str(), config.processor.api_key.clone());

        let store = S3ObjectStore::new(&config.store)
            .await
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        Ok(Self::with_services(
            PipelineSettings::from(config),
            Arc::new(origin),
            Arc::new(processor),
            Arc::new(store),
        ))
    }

    /// Build a pipeline over explicit collaborators (primarily for tests
    /// and embedding)
    pub fn with_services(
        settings: PipelineSettings,
        origin: Arc<dyn OriginAssetService>,
        processor: Arc<dyn JobProcessor>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            origin,
            processor,
            store,
            settings,
        }
    }

    /// Run the pipeline to completion.
    ///
    /// Returns [`PipelineOutcome::Degraded`] when only the best-effort
    /// attachment step failed; every other failure aborts the run. The
    /// caller-imposed deadline and the stage-local attempt bounds are
    /// independent; whichever elapses first wins.
    pub async fn run(&self, request: DubRequest) -> Result<PipelineOutcome, PipelineError> {
        let mut trace = Vec::new();
        let result = self.run_traced(&request, &mut trace).await;

        if let Err(e) = &result {
            tracing::error!(
                "Pipeline aborted in state {} for asset {}: {}",
                trace.last().copied().unwrap_or(PipelineState::Idle),
                request.asset_id,
                e
            );
        }

        result
    }

    async fn run_traced(
        &self,
        request: &DubRequest,
        trace: &mut Vec<PipelineState>,
    ) -> Result<PipelineOutcome, PipelineError> {
        trace.push(PipelineState::Idle);

        match request.deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.execute(request, trace)).await {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::DeadlineExceeded(deadline)),
                }
            }
            None => self.execute(request, trace).await,
        }
    }

    async fn execute(
        &self,
        request: &DubRequest,
        trace: &mut Vec<PipelineState>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let language = canonical_language_code(&request.target_language);

        transition(trace, PipelineState::CheckingReadiness);
        let asset = ReadinessPoller::new(
            self.origin.as_ref(),
            self.settings.rendition_poll_interval,
            self.settings.rendition_max_attempts,
        )
        .wait_for_rendition(&request.asset_id, RenditionKind::AudioOnly)
        .await?;

        transition(trace, PipelineState::Submitting);
        let job_id = self.submit(request, &language, &asset).await?;

        transition(trace, PipelineState::Polling);
        let job = JobStatusPoller::new(
            self.processor.as_ref(),
            self.settings.job_poll_interval,
            self.settings.job_max_attempts,
        )
        .wait_for_completion(&job_id)
        .await?;

        if !request.upload_enabled {
            transition(trace, PipelineState::Done);
            tracing::info!("Upload disabled, returning job {} without transfer", job.id);
            return Ok(PipelineOutcome::Complete(result_record(
                request, &language, &job.id, None, None,
            )));
        }

        transition(trace, PipelineState::Transferring);
        let stored = ArtifactTransfer::new(
            self.processor.as_ref(),
            self.store.as_ref(),
            self.settings.presign_ttl,
            self.settings.key_prefix.clone(),
        )
        .transfer(&request.asset_id, &language, &job)
        .await?;

        transition(trace, PipelineState::Attaching);
        let attached = self.attach(request, &language, &stored).await;

        transition(trace, PipelineState::Done);

        match attached {
            Ok(track_id) => Ok(PipelineOutcome::Complete(result_record(
                request,
                &language,
                &job.id,
                Some(track_id),
                Some(&stored),
            ))),
            Err(warning) => {
                tracing::warn!("{}", warning);
                Ok(PipelineOutcome::Degraded {
                    result: result_record(request, &language, &job.id, None, Some(&stored)),
                    warning,
                })
            }
        }
    }

    /// Download the source rendition and submit the dubbing job, retrying
    /// retryable submission failures
    async fn submit(
        &self,
        request: &DubRequest,
        language: &str,
        asset: &crate::model::SourceAsset,
    ) -> Result<String, PipelineError> {
        let payload = self
            .origin
            .fetch_rendition(asset, RenditionKind::AudioOnly)
            .await
            .map_err(|source| PipelineError::Service {
                stage: "submission",
                source,
            })?;

        let params = JobParams {
            target_language: language.to_string(),
            speaker_count: request.speaker_count,
        };

        let submitted = with_retry(&self.settings.retry, "job submission", || {
            let payload = payload.clone();
            let params = &params;
            async move { self.processor.submit_job(payload, params).await }
        })
        .await
        .map_err(|e| PipelineError::Submission {
            reason: e.error.to_string(),
            attempts: e.attempts,
        })?;

        tracing::info!(
            "Submitted job {} for asset {} ({} attempt(s))",
            submitted.value,
            request.asset_id,
            submitted.attempts
        );

        Ok(submitted.value)
    }

    /// Best-effort origin attachment: one attempt, failure degrades the
    /// outcome instead of aborting
    async fn attach(
        &self,
        request: &DubRequest,
        language: &str,
        stored: &StoredArtifact,
    ) -> Result<String, AttachmentWarning> {
        let track = NewTrack {
            kind: "audio".to_string(),
            language_code: language.to_string(),
            name: track_name(language),
            url: stored.url.clone(),
        };

        self.origin
            .create_track(&request.asset_id, track)
            .await
            .map_err(|e| AttachmentWarning {
                asset_id: request.asset_id.clone(),
                reason: e.to_string(),
            })
    }
}

fn transition(trace: &mut Vec<PipelineState>, next: PipelineState) {
    if let Some(current) = trace.last() {
        tracing::debug!("Pipeline state: {} -> {}", current, next);
    }
    trace.push(next);
}

fn result_record(
    request: &DubRequest,
    language: &str,
    job_id: &str,
    attached_track_id: Option<String>,
    stored: Option<&StoredArtifact>,
) -> PipelineResult {
    PipelineResult {
        asset_id: request.asset_id.clone(),
        target_language: language.to_string(),
        job_id: job_id.to_string(),
        attached_track_id,
        presigned_url: stored.map(|s| s.url.clone()),
        url_expires_at: stored.map(|s| s.expires_at),
        completed_at: chrono::Utc::now(),
    }
}
