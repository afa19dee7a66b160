use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "autodub",
    about = "Autodub - Dub media assets into other languages via an external dubbing processor",
    version,
    long_about = "A CLI tool that drives the full dubbing workflow for an origin media asset: waits for the audio rendition, submits a dubbing job, polls it to completion, uploads the dubbed audio to object storage, and attaches it back to the asset as a new track."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dub an origin asset into a target language
    Dub {
        /// Origin asset id to dub
        #[arg(value_name = "ASSET_ID")]
        asset_id: String,

        /// Target language code or name (falls back to the configured default)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Number of speakers in the source audio (helps voice separation)
        #[arg(long, value_name = "COUNT")]
        speakers: Option<u32>,

        /// Skip the upload and attachment steps, returning the job id only
        #[arg(long)]
        no_upload: bool,

        /// Overall deadline for the whole run, in seconds
        #[arg(long, value_name = "SECONDS")]
        deadline: Option<u64>,

        /// Write the result record as JSON to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Configure service endpoints and pipeline settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported dubbing target languages
    Targets,
}
