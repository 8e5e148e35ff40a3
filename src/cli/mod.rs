use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "facilita",
    about = "Facilita CLI - Transcribe local media files and YouTube videos through the Facilita AI API",
    version,
    long_about = "A CLI tool that converts video or audio input to a compact MP3, uploads it to the Facilita AI API and prints the generated transcription. YouTube links are resolved to audio through a RapidAPI service."
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
    /// Transcribe a local media file or a YouTube link
    Transcribe {
        /// Video/audio file path or YouTube URL
        #[arg(value_name = "MEDIA")]
        media: String,

        /// Prompt text to steer the transcription
        #[arg(short, long, value_name = "TEXT", conflicts_with = "prompt_id")]
        prompt: Option<String>,

        /// Use a prompt template by id (see the prompts command)
        #[arg(long, value_name = "ID")]
        prompt_id: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (config default when not given)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Keep the converted audio file next to the transcription
        #[arg(long)]
        save_audio: bool,
    },

    /// List the prompt templates the API offers
    Prompts,

    /// List supported media sources
    Sources,

    /// Inspect or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with source metadata
    Json,
}

impl OutputFormat {
    /// Parse a config-file format name; unknown names fall back to text.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
