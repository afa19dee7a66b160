use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod error;
mod model;
mod pipeline;
mod retry;
mod services;
mod utils;

use cli::{Cli, Commands};
use config::Config;
use model::PipelineOutcome;
use pipeline::{DubRequest, DubbingPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autodub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load().await?;

    match cli.command {
        Commands::Dub {
            asset_id,
            language,
            speakers,
            no_upload,
            deadline,
            output,
        } => {
            let language = language
                .or_else(|| config.pipeline.default_language.clone())
                .context("No target language given and no default configured (use --language)")?;

            let request = DubRequest {
                asset_id: asset_id.clone(),
                target_language: language,
                speaker_count: speakers.or(config.pipeline.default_speaker_count),
                upload_enabled: !no_upload && config.pipeline.upload_enabled,
                deadline: deadline.map(Duration::from_secs),
            };

            let pipeline = DubbingPipeline::new(&config).await?;

            tracing::info!("Starting dubbing pipeline for asset: {}", asset_id);

            let progress = (!cli.quiet).then(|| {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .unwrap(),
                );
                spinner.set_message(format!("Dubbing asset {}...", asset_id));
                spinner.enable_steady_tick(Duration::from_millis(120));
                spinner
            });

            let outcome = pipeline.run(request).await;

            if let Some(spinner) = progress {
                spinner.finish_and_clear();
            }

            let outcome = outcome?;
            let result = outcome.result();

            println!("{}", style("Dubbing complete").green().bold());
            println!("  Asset: {}", result.asset_id);
            println!("  Language: {}", result.target_language);
            println!("  Job: {}", result.job_id);
            if let Some(track_id) = &result.attached_track_id {
                println!("  Track: {}", track_id);
            }
            if let Some(url) = &result.presigned_url {
                println!("  URL: {}", url);
                if let Some(expires) = &result.url_expires_at {
                    println!("  Expires: {}", expires.to_rfc3339());
                }
            }

            if let PipelineOutcome::Degraded { warning, .. } = &outcome {
                eprintln!(
                    "{} {}",
                    style("warning:").yellow().bold(),
                    warning
                );
            }

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(result)?;
                fs_err::write(&path, json)?;
                println!("Result saved to: {}", path.display());
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration written; edit the file to point at your services:");
                println!("  autodub.yaml (local) or the user config directory");
            }
        }
        Commands::Targets => {
            println!("Supported dubbing targets:");
            for (code, name) in utils::supported_targets() {
                println!("  {} - {}", code, name);
            }
        }
    }

    Ok(())
}
