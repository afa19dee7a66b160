//! Autodub - A Rust library and CLI for dubbing media assets
//!
//! This library drives the full dubbing workflow for an origin media asset:
//! it waits for the audio-only rendition to become ready (requesting it if
//! needed), submits a dubbing job to an external processor, polls the job to
//! a terminal state, moves the dubbed artifact into object storage behind a
//! presigned URL, and attaches it back to the asset as a new audio track.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{AttachmentWarning, PipelineError};
pub use model::{PipelineOutcome, PipelineResult};
pub use pipeline::{DubRequest, DubbingPipeline, PipelineSettings};

/// Result type used throughout the binary layer
pub type Result<T> = anyhow::Result<T>;
