//! Binary entry point for Talkreel.
//!
//! - `talkreel generate` submits a script and waits for the finished video
//! - `talkreel status` checks a previously submitted job once

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;
use talkreel_cli::{run_generate, run_status};
use talkreel_provider::{GenerationRequest, ProviderConfig, VideoGenerator};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "talkreel", version, about = "Turn a script into an avatar video")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a video and wait for it to finish
    Generate(GenerateArgs),

    /// Check the status of a submitted video once
    Status(StatusArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Script the avatar should speak
    #[arg(short, long)]
    script: String,

    /// Avatar identifier
    #[arg(short, long, env = "TALKREEL_AVATAR_ID")]
    avatar: String,

    /// Voice identifier
    #[arg(long, env = "TALKREEL_VOICE_ID")]
    voice: String,

    /// Fail instead of printing the stand-in video when the provider fails
    #[arg(long)]
    no_fallback: bool,

    /// Override the poll deadline in seconds (replaces HEYGEN_POLL_DEADLINE_SECONDS)
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct StatusArgs {
    /// Job identifier returned by the provider
    #[arg(value_name = "JOB_ID")]
    job_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the JSON result.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => generate_command(args).await,
        Commands::Status(args) => status_command(args).await,
    }
}

async fn generate_command(args: GenerateArgs) -> Result<()> {
    let mut config = ProviderConfig::from_env();
    if let Some(secs) = args.deadline_secs {
        config = config.with_poll_deadline(Duration::from_secs(secs));
    }
    let generator = VideoGenerator::new(config).context("Failed to initialize video generator")?;
    debug!(config = ?generator.config(), "Loaded provider configuration");
    if !generator.is_live() {
        warn!("HEYGEN_API_KEY not set, the stand-in video will be returned");
    }

    let request = GenerationRequest::new(args.script, args.avatar, args.voice);

    // Ctrl-C abandons polling; the sender stays alive for the whole run.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, abandoning video generation");
            let _ = cancel_tx.send(true);
        }
    });

    let report = run_generate(&generator, &request, !args.no_fallback, Some(cancel_rx))
        .await
        .context("Video generation failed")?;

    print_json(&report)
}

async fn status_command(args: StatusArgs) -> Result<()> {
    let generator = VideoGenerator::from_env().context("Failed to initialize video generator")?;
    let report = run_status(&generator, &args.job_id)
        .await
        .with_context(|| format!("Failed to check status of {}", args.job_id))?;

    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
