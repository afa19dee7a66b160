//! Readiness poller for origin-side renditions.
//!
//! The dubbing source payload is a derived rendition the origin service
//! produces on request. This poller returns the asset once the rendition is
//! ready, triggering creation when it was never requested (or errored on a
//! previous request).

use std::time::Duration;

use tokio::time::sleep;

use crate::error::PipelineError;
use crate::model::{RenditionKind, RenditionState, SourceAsset};
use crate::services::OriginAssetService;

pub struct ReadinessPoller<'a> {
    origin: &'a dyn OriginAssetService,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<'a> ReadinessPoller<'a> {
    pub fn new(origin: &'a dyn OriginAssetService, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            origin,
            poll_interval,
            max_attempts,
        }
    }

    /// Wait until `kind` is ready on the asset and return the asset.
    ///
    /// Performs one initial fetch, at most one creation request, and then up
    /// to `max_attempts` polls. An `errored` state observed mid-poll is
    /// fatal; an `errored` state on the initial fetch triggers a fresh
    /// creation request instead (the previous attempt is dead either way).
    pub async fn wait_for_rendition(
        &self,
        asset_id: &str,
        kind: RenditionKind,
    ) -> Result<SourceAsset, PipelineError> {
        let asset = self.fetch(asset_id).await?;

        match asset.audio_rendition {
            RenditionState::Ready => {
                tracing::debug!("Rendition {} already ready for asset {}", kind.as_str(), asset_id);
                return Ok(asset);
            }
            RenditionState::NotRequested | RenditionState::Errored => {
                tracing::info!("Requesting {} rendition for asset {}", kind.as_str(), asset_id);
                self.origin
                    .request_rendition(asset_id, kind)
                    .await
                    .map_err(|source| PipelineError::Service {
                        stage: "readiness",
                        source,
                    })?;
            }
            RenditionState::Preparing => {
                tracing::debug!("Rendition {} already preparing for asset {}", kind.as_str(), asset_id);
            }
        }

        for attempt in 1..=self.max_attempts {
            sleep(self.poll_interval).await;

            let asset = self.fetch(asset_id).await?;

            match asset.audio_rendition {
                RenditionState::Ready => {
                    tracing::info!(
                        "Rendition {} ready for asset {} after {} poll(s)",
                        kind.as_str(),
                        asset_id,
                        attempt
                    );
                    return Ok(asset);
                }
                RenditionState::Errored => {
                    return Err(PipelineError::RenditionErrored {
                        asset_id: asset_id.to_string(),
                    });
                }
                state => {
                    tracing::debug!(
                        "Rendition {} still {:?} for asset {} (poll {}/{})",
                        kind.as_str(),
                        state,
                        asset_id,
                        attempt,
                        self.max_attempts
                    );
                }
            }
        }

        Err(PipelineError::RenditionTimeout {
            asset_id: asset_id.to_string(),
            attempts: self.max_attempts,
        })
    }

    async fn fetch(&self, asset_id: &str) -> Result<SourceAsset, PipelineError> {
        self.origin
            .get_asset(asset_id)
            .await
            .map_err(|source| PipelineError::Service {
                stage: "readiness",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::model::{ArtifactBlob, PlaybackPolicy};
    use crate::services::{NewTrack, ServiceError};

    fn asset_with(state: RenditionState) -> SourceAsset {
        SourceAsset {
            id: "asset-1".to_string(),
            audio_rendition: state,
            duration_secs: Some(120.0),
            tracks: Vec::new(),
            playback_policy: PlaybackPolicy::Public,
            playback_id: Some("pb-1".to_string()),
        }
    }

    /// Origin fake replaying a scripted sequence of rendition states
    struct ScriptedOrigin {
        states: Mutex<Vec<RenditionState>>,
        fetches: AtomicU32,
        rendition_requests: AtomicU32,
    }

    impl ScriptedOrigin {
        fn new(states: Vec<RenditionState>) -> Self {
            Self {
                states: Mutex::new(states),
                fetches: AtomicU32::new(0),
                rendition_requests: AtomicU32::new(0),
            }
        }

        fn fetch_count(&self) -> u32 {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OriginAssetService for ScriptedOrigin {
        async fn get_asset(&self, _asset_id: &str) -> Result<SourceAsset, ServiceError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) as usize;
            let states = self.states.lock().unwrap();
            let state = states.get(n).copied().unwrap_or(*states.last().unwrap());
            Ok(asset_with(state))
        }

        async fn request_rendition(
            &self,
            _asset_id: &str,
            _kind: RenditionKind,
        ) -> Result<(), ServiceError> {
            self.rendition_requests.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_rendition(
            &self,
            _asset: &SourceAsset,
            _kind: RenditionKind,
        ) -> Result<ArtifactBlob, ServiceError> {
            unimplemented!("not exercised by readiness tests")
        }

        async fn create_track(
            &self,
            _asset_id: &str,
            _track: NewTrack,
        ) -> Result<String, ServiceError> {
            unimplemented!("not exercised by readiness tests")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_asset_returns_without_polling() {
        let origin = ScriptedOrigin::new(vec![RenditionState::Ready]);
        let poller = ReadinessPoller::new(&origin, Duration::from_secs(5), 36);

        let asset = poller
            .wait_for_rendition("asset-1", RenditionKind::AudioOnly)
            .await
            .unwrap();

        assert_eq!(asset.audio_rendition, RenditionState::Ready);
        assert_eq!(origin.fetch_count(), 1);
        assert_eq!(origin.rendition_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_k_polls_fetches_k_plus_one_times() {
        let k = 3;
        let mut states = vec![RenditionState::Preparing; k];
        states.push(RenditionState::Ready);

        let origin = ScriptedOrigin::new(states);
        let poller = ReadinessPoller::new(&origin, Duration::from_secs(5), 36);

        poller
            .wait_for_rendition("asset-1", RenditionKind::AudioOnly)
            .await
            .unwrap();

        assert_eq!(origin.fetch_count(), k as u32 + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_requested_triggers_single_creation_request() {
        let origin = ScriptedOrigin::new(vec![
            RenditionState::NotRequested,
            RenditionState::Preparing,
            RenditionState::Ready,
        ]);
        let poller = ReadinessPoller::new(&origin, Duration::from_secs(5), 36);

        poller
            .wait_for_rendition("asset-1", RenditionKind::AudioOnly)
            .await
            .unwrap();

        assert_eq!(origin.rendition_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_max_attempts() {
        let origin = ScriptedOrigin::new(vec![RenditionState::Preparing]);
        let poller = ReadinessPoller::new(&origin, Duration::from_secs(5), 4);

        let err = poller
            .wait_for_rendition("asset-1", RenditionKind::AudioOnly)
            .await
            .unwrap_err();

        match err {
            PipelineError::RenditionTimeout { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("expected RenditionTimeout, got {:?}", other),
        }
        // initial fetch plus exactly max_attempts polls
        assert_eq!(origin.fetch_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errored_mid_poll_is_fatal() {
        let origin = ScriptedOrigin::new(vec![
            RenditionState::Preparing,
            RenditionState::Preparing,
            RenditionState::Errored,
        ]);
        let poller = ReadinessPoller::new(&origin, Duration::from_secs(5), 36);

        let err = poller
            .wait_for_rendition("asset-1", RenditionKind::AudioOnly)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::RenditionErrored { .. }));
        assert_eq!(origin.fetch_count(), 3);
    }
}
