use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::FacilitaError;
use crate::sources::{AudioTrack, AUDIO_FILE_NAME, AUDIO_MIME};
use crate::Result;

/// A reusable prompt offered by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub title: String,
    pub template: String,
}

/// Body of a successful upload: `{"video": {"id": "..."}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub video: UploadedVideo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedVideo {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TranscriptionResponse {
    transcription: String,
}

/// The remote operations the pipeline needs from the transcription API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Upload the MP3 and get back the server-side video id
    async fn upload_audio(&self, track: &AudioTrack) -> Result<UploadedVideo>;

    /// Ask for a transcription of an uploaded video
    async fn request_transcription(&self, video_id: &str, prompt: &str) -> Result<String>;

    /// Fetch the prompt templates the API offers
    async fn list_prompts(&self) -> Result<Vec<PromptTemplate>>;
}

/// HTTP client for the Facilita AI API
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn non-2xx responses into an error carrying the body the server sent.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(FacilitaError::ApiFailure { status, body }.into())
    }
}

#[async_trait]
impl TranscriptionService for ApiClient {
    async fn upload_audio(&self, track: &AudioTrack) -> Result<UploadedVideo> {
        tracing::info!("Uploading audio to: {}", self.endpoint("videos"));

        let content = fs_err::read(&track.path)?;
        let part = reqwest::multipart::Part::bytes(content)
            .file_name(AUDIO_FILE_NAME)
            .mime_str(AUDIO_MIME)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("videos"))
            .multipart(form)
            .send()
            .await?;

        let response = Self::check(response).await?;
        let upload: UploadResponse = response.json().await?;

        tracing::debug!("Upload accepted with video id: {}", upload.video.id);
        Ok(upload.video)
    }

    async fn request_transcription(&self, video_id: &str, prompt: &str) -> Result<String> {
        let url = self.endpoint(&format!("videos/{}/transcription", video_id));
        tracing::info!("Requesting transcription: {}", url);

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        let body: TranscriptionResponse = response.json().await?;

        Ok(body.transcription)
    }

    async fn list_prompts(&self) -> Result<Vec<PromptTemplate>> {
        let response = self.client.get(self.endpoint("prompts")).send().await?;

        let response = Self::check(response).await?;
        let prompts: Vec<PromptTemplate> = response.json().await?;

        Ok(prompts)
    }
}
