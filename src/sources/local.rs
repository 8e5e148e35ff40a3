use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

use super::{AudioTrack, MediaKind, MediaSource, AUDIO_FILE_NAME};
use crate::error::FacilitaError;
use crate::Result;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac", "ogg", "opus"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v", "wmv"];

/// Classify a path as video or audio by extension. `None` means we do not
/// take this kind of file.
pub fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

/// Arguments for the ffmpeg re-encode: audio stream only, 20 kbps MP3.
/// The low bitrate keeps uploads small; speech survives it fine.
fn transcode_args(source: &Path, target: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        source.to_string_lossy().into_owned(),
        "-map".into(),
        "0:a".into(),
        "-b:a".into(),
        "20k".into(),
        "-acodec".into(),
        "libmp3lame".into(),
        "-y".into(),
        target.to_string_lossy().into_owned(),
    ]
}

/// Source for files already on disk
pub struct LocalFileSource;

impl LocalFileSource {
    pub fn new() -> Self {
        Self
    }

    /// Check if the file exists and is accessible
    async fn validate_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(
                FacilitaError::InvalidMediaFile(format!("file does not exist: {}", path.display()))
                    .into(),
            );
        }

        if !path.is_file() {
            return Err(
                FacilitaError::InvalidMediaFile(format!("path is not a file: {}", path.display()))
                    .into(),
            );
        }

        let metadata = fs::metadata(path).await?;
        if metadata.len() == 0 {
            return Err(
                FacilitaError::InvalidMediaFile(format!("file is empty: {}", path.display()))
                    .into(),
            );
        }

        Ok(())
    }

    /// Inspect the file with ffprobe: duration plus a check that there is an
    /// audio stream to extract at all.
    async fn probe(&self, path: &Path) -> Result<Option<f64>> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &path.to_string_lossy(),
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(FacilitaError::InvalidMediaFile(format!(
                "ffprobe could not read {}",
                path.display()
            ))
            .into());
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        let duration = info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok());

        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);
        let has_audio = streams
            .iter()
            .any(|stream| stream["codec_type"].as_str() == Some("audio"));

        if !has_audio {
            return Err(FacilitaError::InvalidMediaFile(format!(
                "file has no audio stream: {}",
                path.display()
            ))
            .into());
        }

        Ok(duration)
    }

    /// Re-encode to 20 kbps MP3 using ffmpeg
    async fn convert_to_mp3(&self, source: &Path, target: &Path) -> Result<()> {
        tracing::debug!("Converting {} to MP3", source.display());

        let output = Command::new("ffmpeg")
            .args(transcode_args(source, target))
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(FacilitaError::ConversionFailed(error.into_owned()).into());
        }

        Ok(())
    }
}

#[async_trait]
impl MediaSource for LocalFileSource {
    fn supports(&self, input: &str) -> bool {
        if input.starts_with("http://") || input.starts_with("https://") {
            return false;
        }

        let path = Path::new(input);
        path.exists() || classify(path).is_some()
    }

    async fn acquire(&self, input: &str, work_dir: &Path) -> Result<AudioTrack> {
        let source = Path::new(input);

        self.validate_file(source).await?;

        let kind = classify(source).ok_or_else(|| {
            FacilitaError::UnsupportedSource(format!(
                "{} is not a media format we recognize",
                source.display()
            ))
        })?;

        let target = work_dir.join(AUDIO_FILE_NAME);

        // MP3 input skips the probe and re-encode entirely
        let duration = if is_mp3(source) {
            tracing::debug!("Copying MP3 as-is: {}", source.display());
            fs::copy(source, &target).await?;
            None
        } else {
            let duration = self.probe(source).await?;
            self.convert_to_mp3(source, &target).await?;
            duration
        };

        let title = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.to_string());

        let metadata = fs::metadata(&target).await?;

        Ok(AudioTrack {
            path: target,
            title,
            duration,
            file_size: Some(metadata.len()),
            kind,
            origin: input.to_string(),
        })
    }

    fn source_name(&self) -> &'static str {
        "Local file"
    }
}

impl Default for LocalFileSource {
    fn default() -> Self {
        Self::new()
    }
}
