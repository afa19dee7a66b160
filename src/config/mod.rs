use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Origin asset service
    pub origin: OriginConfig,

    /// External dubbing job processor
    pub processor: ProcessorConfig,

    /// Object storage for dubbed artifacts
    pub store: StoreConfig,

    /// Pipeline behavior
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// API base URL of the asset service
    pub base_url: String,

    /// Base URL renditions are served from
    pub media_base_url: String,

    /// Bearer token for API calls
    pub token: Option<String>,

    /// Shared secret for signed playback URLs
    pub signing_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// API base URL of the dubbing processor
    pub base_url: String,

    /// API key sent with every request
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// AWS region (or "auto" for S3-compatible stores)
    pub region: String,

    /// Bucket dubbed artifacts are uploaded to
    pub bucket: String,

    /// Custom endpoint for S3-compatible stores
    pub endpoint_url: Option<String>,

    /// Key prefix inside the bucket
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seconds between rendition readiness polls
    pub rendition_poll_interval_secs: u64,

    /// Maximum rendition readiness polls
    pub rendition_max_attempts: u32,

    /// Seconds between job status polls
    pub job_poll_interval_secs: u64,

    /// Maximum job status polls (dubbing jobs run for minutes)
    pub job_max_attempts: u32,

    /// Validity of minted presigned URLs in seconds
    pub presign_ttl_secs: u64,

    /// Retries after the first submission attempt
    pub retry_max_attempts: u32,

    /// Base backoff delay between submission retries, in milliseconds
    pub retry_base_delay_ms: u64,

    /// Backoff delay cap, in milliseconds
    pub retry_max_delay_ms: u64,

    /// Default target language when the CLI does not pass one
    pub default_language: Option<String>,

    /// Default speaker count hint
    pub default_speaker_count: Option<u32>,

    /// Upload the dubbed artifact and attach it to the asset
    pub upload_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: OriginConfig {
                base_url: "https://api.origin.example.com".to_string(),
                media_base_url: "https://media.origin.example.com".to_string(),
                token: None,
                signing_secret: None,
            },
            processor: ProcessorConfig {
                base_url: "https://api.dubbing.example.com".to_string(),
                api_key: None,
            },
            store: StoreConfig {
                region: "us-east-1".to_string(),
                bucket: "".to_string(),
                endpoint_url: None,
                key_prefix: Some("dubbing/".to_string()),
            },
            pipeline: PipelineConfig {
                rendition_poll_interval_secs: 5,
                rendition_max_attempts: 36,
                job_poll_interval_secs: 10,
                job_max_attempts: 180,
                presign_ttl_secs: 3600,
                retry_max_attempts: 3,
                retry_base_delay_ms: 500,
                retry_max_delay_ms: 10_000,
                default_language: None,
                default_speaker_count: None,
                upload_enabled: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("autodub.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("autodub").join("config.yaml"))
    }

    /// Validate configuration before any network call
    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        if self.store.bucket.is_empty() {
            return Err(PipelineError::Configuration(
                "store.bucket must be configured".to_string(),
            ));
        }

        for (name, value) in [
            ("origin.base_url", &self.origin.base_url),
            ("origin.media_base_url", &self.origin.media_base_url),
            ("processor.base_url", &self.processor.base_url),
        ] {
            Url::parse(value).map_err(|_| {
                PipelineError::Configuration(format!("{} is not a valid URL: {}", name, value))
            })?;
        }

        if self.pipeline.presign_ttl_secs == 0 {
            return Err(PipelineError::Configuration(
                "pipeline.presign_ttl_secs must be positive".to_string(),
            ));
        }

        if self.pipeline.rendition_max_attempts == 0 || self.pipeline.job_max_attempts == 0 {
            return Err(PipelineError::Configuration(
                "poll attempt bounds must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Display current configuration (secrets redacted)
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Origin API: {}", self.origin.base_url);
        println!("  Origin Media: {}", self.origin.media_base_url);
        println!("  Processor API: {}", self.processor.base_url);
        println!("  Store Region: {}", self.store.region);
        println!("  Store Bucket: {}", self.store.bucket);
        if let Some(endpoint) = &self.store.endpoint_url {
            println!("  Store Endpoint: {}", endpoint);
        }
        if let Some(prefix) = &self.store.key_prefix {
            println!("  Key Prefix: {}", prefix);
        }
        println!("  Presign TTL: {}s", self.pipeline.presign_ttl_secs);
        println!("  Upload Enabled: {}", self.pipeline.upload_enabled);
        if let Some(lang) = &self.pipeline.default_language {
            println!("  Default Language: {}", lang);
        }
    }
}
