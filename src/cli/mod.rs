use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcript-api",
    about = "YouTube Transcript API - serve YouTube captions as JSON or timestamped text",
    version,
    long_about = "A small HTTP service that fetches YouTube video transcripts. Requests are retried through a local SOCKS proxy and a direct connection with rotating language preferences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Interface to bind (overrides the config file)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long, env = "PORT", value_name = "PORT")]
        port: Option<u16>,
    },

    /// Fetch one transcript and print or save it
    Fetch {
        /// YouTube video id or URL
        #[arg(value_name = "VIDEO")]
        video: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Number of attempts (defaults to the configured value)
        #[arg(short, long, value_name = "COUNT")]
        attempts: Option<u32>,

        /// Skip the proxied first attempt
        #[arg(long)]
        no_proxy: bool,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Timestamped plain text
    Text,
    /// JSON array of entries
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}
