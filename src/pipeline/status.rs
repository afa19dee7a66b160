//! Job status poller for the external dubbing processor.
//!
//! Dubbing jobs run for minutes, not seconds, so the attempt bound here is
//! deliberately generous compared to the rendition readiness poller.

use std::time::Duration;

use tokio::time::sleep;

use crate::error::PipelineError;
use crate::model::{JobStatus, TransformJob};
use crate::services::JobProcessor;

pub struct JobStatusPoller<'a> {
    processor: &'a dyn JobProcessor,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<'a> JobStatusPoller<'a> {
    pub fn new(processor: &'a dyn JobProcessor, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            processor,
            poll_interval,
            max_attempts,
        }
    }

    /// Poll until the job reaches a terminal state.
    ///
    /// `submitted` and `processing` are both non-terminal and treated
    /// identically. A `failed` status aborts immediately without a further
    /// poll; exhausting the attempt budget reports the last observed status.
    pub async fn wait_for_completion(&self, job_id: &str) -> Result<TransformJob, PipelineError> {
        let mut last_status = JobStatus::Submitted;

        for attempt in 1..=self.max_attempts {
            let job = self
                .processor
                .get_job(job_id)
                .await
                .map_err(|source| PipelineError::Service {
                    stage: "job-status",
                    source,
                })?;

            match job.status {
                JobStatus::Succeeded => {
                    tracing::info!("Job {} succeeded after {} poll(s)", job_id, attempt);
                    return Ok(job);
                }
                JobStatus::Failed => {
                    return Err(PipelineError::JobFailed {
                        job_id: job_id.to_string(),
                        reason: job
                            .failure_reason
                            .unwrap_or_else(|| "no reason reported".to_string()),
                    });
                }
                status => {
                    last_status = status;
                    tracing::debug!(
                        "Job {} still {} (poll {}/{})",
                        job_id,
                        status,
                        attempt,
                        self.max_attempts
                    );

                    if attempt < self.max_attempts {
                        sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(PipelineError::JobTimeout {
            job_id: job_id.to_string(),
            last_status,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::model::{ArtifactBlob, JobParams};
    use crate::services::ServiceError;

    fn job_with(status: JobStatus) -> TransformJob {
        TransformJob {
            id: "job-1".to_string(),
            target_language: "fr".to_string(),
            speaker_count: None,
            status,
            variants: vec!["fr".to_string()],
            failure_reason: match status {
                JobStatus::Failed => Some("voice cloning rejected".to_string()),
                _ => None,
            },
        }
    }

    /// Processor fake replaying a scripted status sequence
    struct ScriptedProcessor {
        statuses: Mutex<Vec<JobStatus>>,
        polls: AtomicU32,
    }

    impl ScriptedProcessor {
        fn new(statuses: Vec<JobStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses),
                polls: AtomicU32::new(0),
            }
        }

        fn poll_count(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobProcessor for ScriptedProcessor {
        async fn submit_job(
            &self,
            _payload: ArtifactBlob,
            _params: &JobParams,
        ) -> Result<String, ServiceError> {
            unimplemented!("not exercised by status tests")
        }

        async fn get_job(&self, _job_id: &str) -> Result<TransformJob, ServiceError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) as usize;
            let statuses = self.statuses.lock().unwrap();
            let status = statuses.get(n).copied().unwrap_or(*statuses.last().unwrap());
            Ok(job_with(status))
        }

        async fn download_variant(
            &self,
            _job_id: &str,
            _variant: &str,
        ) -> Result<ArtifactBlob, ServiceError> {
            unimplemented!("not exercised by status tests")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_poll() {
        let processor = ScriptedProcessor::new(vec![JobStatus::Succeeded]);
        let poller = JobStatusPoller::new(&processor, Duration::from_secs(10), 180);

        let job = poller.wait_for_completion("job-1").await.unwrap();

        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(processor.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_and_processing_both_keep_polling() {
        let processor = ScriptedProcessor::new(vec![
            JobStatus::Submitted,
            JobStatus::Processing,
            JobStatus::Processing,
            JobStatus::Succeeded,
        ]);
        let poller = JobStatusPoller::new(&processor, Duration::from_secs(10), 180);

        poller.wait_for_completion("job-1").await.unwrap();

        assert_eq!(processor.poll_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_polling_immediately() {
        let processor = ScriptedProcessor::new(vec![
            JobStatus::Processing,
            JobStatus::Processing,
            JobStatus::Failed,
            JobStatus::Succeeded,
        ]);
        let poller = JobStatusPoller::new(&processor, Duration::from_secs(10), 180);

        let err = poller.wait_for_completion("job-1").await.unwrap_err();

        match err {
            PipelineError::JobFailed { job_id, reason } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(reason, "voice cloning rejected");
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
        // no fourth poll after the failure
        assert_eq!(processor.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_last_observed_status() {
        let processor = ScriptedProcessor::new(vec![JobStatus::Processing]);
        let poller = JobStatusPoller::new(&processor, Duration::from_secs(10), 6);

        let err = poller.wait_for_completion("job-1").await.unwrap_err();

        match err {
            PipelineError::JobTimeout {
                last_status,
                attempts,
                ..
            } => {
                assert_eq!(last_status, JobStatus::Processing);
                assert_eq!(attempts, 6);
            }
            other => panic!("expected JobTimeout, got {:?}", other),
        }
        assert_eq!(processor.poll_count(), 6);
    }
}
