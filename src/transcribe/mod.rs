use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::api::{ApiClient, TranscriptionService};
use crate::config::Config;
use crate::error::FacilitaError;
use crate::sources::{AudioTrack, SourceRegistry};
use crate::status::{StatusReporter, UploadStatus};

/// Everything a finished transcription attempt produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOutcome {
    /// Server-side id of the uploaded video
    pub video_id: String,

    /// The transcribed text
    pub transcription: String,

    /// Prompt that was sent along with the request
    pub prompt: String,

    /// The audio track that was uploaded
    pub track: AudioTrack,

    /// Path to the preserved audio file (if keep_audio is set)
    pub audio_path: Option<PathBuf>,

    /// Timestamp when the transcription arrived
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Main transcription pipeline
pub struct TranscriptionPipeline {
    config: Config,
    registry: SourceRegistry,
    service: Arc<dyn TranscriptionService>,
    temp_dir: TempDir,
}

impl TranscriptionPipeline {
    /// Create a new transcription pipeline against the configured API
    pub fn new(config: Config) -> Result<Self> {
        let registry = SourceRegistry::new(&config.resolver);
        let service = Arc::new(ApiClient::new(&config.api.base_url));
        Self::with_parts(config, registry, service)
    }

    /// Assemble a pipeline from explicit parts. This is the seam for
    /// swapping in a different service implementation.
    pub fn with_parts(
        config: Config,
        registry: SourceRegistry,
        service: Arc<dyn TranscriptionService>,
    ) -> Result<Self> {
        let temp_dir = match &config.app.temp_dir {
            Some(dir) => {
                fs_err::create_dir_all(dir)?;
                TempDir::new_in(dir)
            }
            None => TempDir::new(),
        }
        .context("Failed to create temporary directory")?;

        Ok(Self {
            config,
            registry,
            service,
            temp_dir,
        })
    }

    /// Turn the CLI prompt flags into the prompt text to submit. An explicit
    /// prompt wins; a prompt id is looked up via the API; neither means the
    /// API gets an empty prompt and picks its own default.
    pub async fn resolve_prompt(
        &self,
        prompt: Option<String>,
        prompt_id: Option<String>,
    ) -> Result<String> {
        match (prompt, prompt_id) {
            (Some(text), _) => Ok(text),
            (None, Some(id)) => {
                let prompts = self.service.list_prompts().await?;
                let found = prompts.iter().find(|prompt| prompt.id == id);
                match found {
                    Some(prompt) => Ok(prompt.template.clone()),
                    None => {
                        let available = if prompts.is_empty() {
                            "none".to_string()
                        } else {
                            prompts
                                .iter()
                                .map(|prompt| prompt.id.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        };
                        anyhow::bail!(
                            "No prompt template with id '{}' (available: {})",
                            id,
                            available
                        )
                    }
                }
            }
            (None, None) => Ok(String::new()),
        }
    }

    /// Run the whole attempt, keeping the reporter honest about the final
    /// state: validation failures rewind to `waiting`, anything else leaves
    /// the status at the stage that broke.
    pub async fn run(
        &self,
        input: &str,
        prompt: &str,
        reporter: &mut StatusReporter,
    ) -> Result<TranscriptionOutcome> {
        match self.try_run(input, prompt, reporter).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let is_validation = err
                    .downcast_ref::<FacilitaError>()
                    .map(|err| err.is_validation())
                    .unwrap_or(false);
                if is_validation {
                    reporter.reset();
                } else {
                    reporter.fail();
                }
                Err(err)
            }
        }
    }

    async fn try_run(
        &self,
        input: &str,
        prompt: &str,
        reporter: &mut StatusReporter,
    ) -> Result<TranscriptionOutcome> {
        // Each attempt gets its own directory under the pipeline temp dir
        let work_dir = self
            .temp_dir
            .path()
            .join(format!("job_{}", &Uuid::new_v4().to_string()[..8]));
        fs_err::create_dir_all(&work_dir)?;

        reporter.advance(UploadStatus::Converting)?;
        let track = self.registry.acquire(input, &work_dir).await?;

        reporter.advance(UploadStatus::Uploading)?;
        let video = self.service.upload_audio(&track).await?;

        reporter.advance(UploadStatus::Generating)?;
        let transcription = self.service.request_transcription(&video.id, prompt).await?;

        reporter.advance(UploadStatus::Success)?;

        let audio_path = if self.config.app.keep_audio {
            Some(self.preserve_audio_file(&track).await?)
        } else {
            None
        };

        Ok(TranscriptionOutcome {
            video_id: video.id,
            transcription,
            prompt: prompt.to_string(),
            track,
            audio_path,
            completed_at: chrono::Utc::now(),
        })
    }

    /// Copy the uploaded MP3 into the current directory so it survives the
    /// temp dir cleanup.
    async fn preserve_audio_file(&self, track: &AudioTrack) -> Result<PathBuf> {
        let filename = preferred_audio_name(track.title.as_deref());

        let output_path = std::env::current_dir()?.join(filename);
        fs_err::copy(&track.path, &output_path)?;

        Ok(output_path)
    }
}

fn preferred_audio_name(title: Option<&str>) -> String {
    title
        .map(|title| format!("{}.mp3", crate::utils::sanitize_filename(title)))
        .unwrap_or_else(|| format!("audio_{}.mp3", chrono::Utc::now().format("%Y%m%d_%H%M%S")))
}
