//! Facilita CLI - A Rust tool for transcribing local media files and YouTube videos
//!
//! This library converts video/audio input to compressed MP3, uploads it to the
//! Facilita AI transcription API and tracks the upload status along the way.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod sources;
pub mod status;
pub mod transcribe;
pub mod utils;

pub use api::{ApiClient, PromptTemplate, TranscriptionService};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use error::FacilitaError;
pub use sources::{AudioTrack, MediaKind, MediaSource, SourceRegistry};
pub use status::{StatusReporter, UploadStatus};
pub use transcribe::{TranscriptionOutcome, TranscriptionPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
