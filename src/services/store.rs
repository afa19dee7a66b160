//! S3-compatible object store client.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use super::{ObjectStore, ServiceError};
use crate::config::StoreConfig;
use crate::model::ArtifactBlob;

/// Object store backed by S3 (or any S3-compatible endpoint)
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from configuration, using the default AWS credential
    /// chain
    pub async fn new(config: &StoreConfig) -> Result<Self, ServiceError> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let client = S3Client::new(&sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, blob: ArtifactBlob) -> Result<(), ServiceError> {
        tracing::debug!("Uploading {} bytes to s3://{}/{}", blob.len(), self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(blob.bytes))
            .content_type(blob.content_type)
            .send()
            .await
            .map_err(|e| ServiceError::Other(format!("S3 put_object: {}", e)))?;

        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, ServiceError> {
        let presign_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| ServiceError::Validation(format!("presign config: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| ServiceError::Other(format!("S3 presign: {}", e)))?;

        Ok(presigned.uri().to_string())
    }
}
