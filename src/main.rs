use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript_server::server::{self, AppState};
use yt_transcript_server::utils::{extract_video_id, format_duration};
use yt_transcript_server::{output, Cli, Commands, Config, RetryOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "yt_transcript_server=debug,tower_http=debug"
    } else {
        "yt_transcript_server=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .context("Invalid host/port bind address")?;

            let state = AppState::from_config(&config)?;
            tracing::info!(
                "Starting transcript API (attempts: {}, proxy: {})",
                config.retry.max_attempts,
                config.retry.proxy_url.as_deref().unwrap_or("disabled")
            );

            server::serve(state, addr).await?;
        }
        Commands::Fetch {
            video,
            output,
            format,
            attempts,
            no_proxy,
        } => {
            let video_id = extract_video_id(&video)
                .ok_or_else(|| anyhow::anyhow!("Not a YouTube video id or URL: {}", video))?;

            if no_proxy {
                config.retry.proxy_url = None;
            }
            let attempts = attempts.unwrap_or(config.retry.max_attempts);
            let orchestrator = RetryOrchestrator::from_config(&config)?;

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .context("Invalid progress template")?,
            );
            progress.set_message(format!("Fetching transcript for {}...", video_id));
            progress.enable_steady_tick(Duration::from_millis(120));

            let result = orchestrator.fetch_with_attempts(&video_id, attempts).await;
            progress.finish_and_clear();

            let transcript = result
                .with_context(|| format!("Failed to fetch transcript for {}", video_id))?;

            tracing::info!(
                "Fetched {} entries ({}, {}) spanning {}",
                transcript.len(),
                transcript.language,
                transcript.language_code,
                format_duration(transcript.duration())
            );

            match output {
                Some(path) => {
                    output::save_to_file(&transcript, &path, &format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&transcript, &format)?;
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                match cli.config {
                    Some(path) => println!("Config file: {}", path.display()),
                    None => println!("Config file: {}", Config::config_path()?.display()),
                }
                println!("Use --show to print the effective configuration");
            }
        }
    }

    Ok(())
}
