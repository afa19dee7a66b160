//! Artifact transfer: processor download, object-store upload, presign.

use std::time::Duration;

use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::{StoredArtifact, TransformJob};
use crate::services::{JobProcessor, ObjectStore};
use crate::utils::extension_for_content_type;

/// Pick the variant to download.
///
/// Fallback order is part of the external contract and must not be
/// reordered: exact match, case-insensitive match, first available variant,
/// and finally the requested code unchanged when the job reported none.
pub fn select_variant(requested: &str, available: &[String]) -> String {
    if available.iter().any(|v| v == requested) {
        return requested.to_string();
    }

    if let Some(v) = available.iter().find(|v| v.eq_ignore_ascii_case(requested)) {
        tracing::warn!(
            "Variant {} not found, substituting case-insensitive match {}",
            requested,
            v
        );
        return v.clone();
    }

    if let Some(first) = available.first() {
        tracing::warn!(
            "Variant {} not produced by the job, substituting first available variant {}",
            requested,
            first
        );
        return first.clone();
    }

    requested.to_string()
}

pub struct ArtifactTransfer<'a> {
    processor: &'a dyn JobProcessor,
    store: &'a dyn ObjectStore,
    presign_ttl: Duration,
    key_prefix: String,
}

impl<'a> ArtifactTransfer<'a> {
    pub fn new(
        processor: &'a dyn JobProcessor,
        store: &'a dyn ObjectStore,
        presign_ttl: Duration,
        key_prefix: String,
    ) -> Self {
        Self {
            processor,
            store,
            presign_ttl,
            key_prefix,
        }
    }

    /// Move the finished artifact from the processor into object storage
    /// and mint a presigned retrieval URL.
    ///
    /// `requested_variant` is the caller's resolved language code, not the
    /// processor's echo of it, so the fallback chain is decided against what
    /// was actually asked for. The URL TTL is measured from this moment, not
    /// from job completion. Failures are fatal here; retry policy belongs to
    /// the orchestrator.
    pub async fn transfer(
        &self,
        asset_id: &str,
        requested_variant: &str,
        job: &TransformJob,
    ) -> Result<StoredArtifact, PipelineError> {
        let variant = select_variant(requested_variant, &job.variants);

        let blob = self
            .processor
            .download_variant(&job.id, &variant)
            .await
            .map_err(|e| PipelineError::Transfer {
                job_id: job.id.clone(),
                reason: format!("download failed: {}", e),
            })?;

        let key = format!(
            "{}{}/{}_{}_{}.{}",
            self.key_prefix,
            asset_id,
            job.id,
            variant,
            Uuid::new_v4(),
            extension_for_content_type(&blob.content_type)
        );

        tracing::info!(
            "Uploading {} byte {} artifact to s3://{}/{}",
            blob.len(),
            variant,
            self.store.bucket(),
            key
        );

        self.store
            .put_object(&key, blob)
            .await
            .map_err(|e| PipelineError::Transfer {
                job_id: job.id.clone(),
                reason: format!("upload failed: {}", e),
            })?;

        let url = self
            .store
            .presign_get(&key, self.presign_ttl)
            .await
            .map_err(|e| PipelineError::Transfer {
                job_id: job.id.clone(),
                reason: format!("presign failed: {}", e),
            })?;

        // TTL runs from the moment of minting, not from job completion
        let expires_at = chrono::Utc::now()
            + chrono::Duration::from_std(self.presign_ttl).unwrap_or(chrono::Duration::zero());

        Ok(StoredArtifact {
            bucket: self.store.bucket().to_string(),
            key,
            url,
            expires_at,
        })
    }
}
