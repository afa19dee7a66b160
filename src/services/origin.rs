//! HTTP client for the origin asset service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;

use super::{error_for_status, NewTrack, OriginAssetService, ServiceError, UrlSigner};
use crate::model::{ArtifactBlob, PlaybackPolicy, RenditionKind, SourceAsset};

/// Default validity of signed playback URLs (10 minutes)
const SIGNED_URL_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Deserialize)]
struct TrackCreated {
    id: String,
}

/// Origin asset service client over HTTP
pub struct HttpOriginClient {
    client: reqwest::Client,
    base_url: String,
    media_base_url: String,
    token: Option<String>,
    signer: Option<Arc<dyn UrlSigner>>,
}

impl HttpOriginClient {
    pub fn new(
        base_url: impl Into<String>,
        media_base_url: impl Into<String>,
        token: Option<String>,
        signer: Option<Arc<dyn UrlSigner>>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            media_base_url: media_base_url.into().trim_end_matches('/').to_string(),
            token,
            signer,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        builder
    }

    /// Playback URL of a rendition, signed when the asset policy requires it
    fn rendition_url(&self, asset: &SourceAsset, kind: RenditionKind) -> Result<String, ServiceError> {
        let playback_id = asset.playback_id.as_deref().ok_or_else(|| {
            ServiceError::Validation(format!("asset {} has no playback id", asset.id))
        })?;

        let url = format!("{}/{}/{}", self.media_base_url, playback_id, kind.file_name());

        match asset.playback_policy {
            PlaybackPolicy::Public => Ok(url),
            PlaybackPolicy::Signed => {
                let signer = self.signer.as_ref().ok_or_else(|| {
                    ServiceError::Validation(format!(
                        "asset {} requires signed playback but no signing secret is configured",
                        asset.id
                    ))
                })?;
                signer.sign_url(&url, &asset.id, SIGNED_URL_TTL)
            }
        }
    }
}

#[async_trait]
impl OriginAssetService for HttpOriginClient {
    async fn get_asset(&self, asset_id: &str) -> Result<SourceAsset, ServiceError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/assets/{}", asset_id))
            .send()
            .await?;

        let response = error_for_status(response).await?;

        response
            .json::<SourceAsset>()
            .await
            .map_err(|e| ServiceError::Malformed(format!("asset response: {}", e)))
    }

    async fn request_rendition(
        &self,
        asset_id: &str,
        kind: RenditionKind,
    ) -> Result<(), ServiceError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/v1/assets/{}/renditions", asset_id),
            )
            .json(&serde_json::json!({ "kind": kind.as_str() }))
            .send()
            .await?;

        // The remote treats rendition creation as idempotent: a conflict
        // means another caller already requested it.
        if response.status() == reqwest::StatusCode::CONFLICT {
            tracing::debug!("Rendition {} already requested for asset {}", kind.as_str(), asset_id);
            return Ok(());
        }

        error_for_status(response).await?;
        Ok(())
    }

    async fn fetch_rendition(
        &self,
        asset: &SourceAsset,
        kind: RenditionKind,
    ) -> Result<ArtifactBlob, ServiceError> {
        let url = self.rendition_url(asset, kind)?;

        tracing::info!("Downloading {} rendition for asset {}", kind.as_str(), asset.id);

        let response = self.client.get(&url).send().await?;
        let response = error_for_status(response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mp4")
            .to_string();

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(ServiceError::from)?;
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ServiceError::Malformed(format!(
                "rendition download for asset {} returned an empty body",
                asset.id
            )));
        }

        Ok(ArtifactBlob::new(bytes, content_type))
    }

    async fn create_track(&self, asset_id: &str, track: NewTrack) -> Result<String, ServiceError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/v1/assets/{}/tracks", asset_id),
            )
            .json(&track)
            .send()
            .await?;

        let response = error_for_status(response).await?;

        let created = response
            .json::<TrackCreated>()
            .await
            .map_err(|e| ServiceError::Malformed(format!("track response: {}", e)))?;

        Ok(created.id)
    }
}
