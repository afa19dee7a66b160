//! HTTP client for the external dubbing job processor.

use async_trait::async_trait;
use serde::Deserialize;

use super::{error_for_status, JobProcessor, ServiceError};
use crate::model::{ArtifactBlob, JobParams, JobStatus, TransformJob};

#[derive(Debug, Deserialize)]
struct JobCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    id: String,
    target_language: String,
    speaker_count: Option<u32>,
    status: JobStatus,
    #[serde(default)]
    variants: Vec<String>,
    failure_reason: Option<String>,
}

impl From<JobRecord> for TransformJob {
    fn from(record: JobRecord) -> Self {
        TransformJob {
            id: record.id,
            target_language: record.target_language,
            speaker_count: record.speaker_count,
            status: record.status,
            variants: record.variants,
            failure_reason: record.failure_reason,
        }
    }
}

/// Dubbing job processor client over HTTP
pub struct HttpJobProcessor {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpJobProcessor {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }
}

#[async_trait]
impl JobProcessor for HttpJobProcessor {
    async fn submit_job(
        &self,
        payload: ArtifactBlob,
        params: &JobParams,
    ) -> Result<String, ServiceError> {
        tracing::info!(
            "Submitting {} byte payload for {} dubbing",
            payload.len(),
            params.target_language
        );

        let mut request = self
            .authorize(self.client.post(format!("{}/v1/jobs", self.base_url)))
            .query(&[("target_language", params.target_language.as_str())])
            // Payload bytes and content type pass through unmodified
            .header(reqwest::header::CONTENT_TYPE, payload.content_type.clone())
            .body(payload.bytes);

        if let Some(speakers) = params.speaker_count {
            request = request.query(&[("speaker_count", speakers.to_string())]);
        }

        let response = error_for_status(request.send().await?).await?;

        let created = response
            .json::<JobCreated>()
            .await
            .map_err(|e| ServiceError::Malformed(format!("job creation response: {}", e)))?;

        Ok(created.id)
    }

    async fn get_job(&self, job_id: &str) -> Result<TransformJob, ServiceError> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/v1/jobs/{}", self.base_url, job_id)),
            )
            .send()
            .await?;

        let response = error_for_status(response).await?;

        let record = response
            .json::<JobRecord>()
            .await
            .map_err(|e| ServiceError::Malformed(format!("job status response: {}", e)))?;

        Ok(record.into())
    }

    async fn download_variant(
        &self,
        job_id: &str,
        variant: &str,
    ) -> Result<ArtifactBlob, ServiceError> {
        let response = self
            .authorize(self.client.get(format!(
                "{}/v1/jobs/{}/variants/{}/audio",
                self.base_url,
                job_id,
                urlencoding::encode(variant)
            )))
            .send()
            .await?;

        let response = error_for_status(response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let bytes = response.bytes().await.map_err(ServiceError::from)?;

        if bytes.is_empty() {
            return Err(ServiceError::Malformed(format!(
                "variant {} of job {} returned an empty body",
                variant, job_id
            )));
        }

        Ok(ArtifactBlob::new(bytes.to_vec(), content_type))
    }
}
