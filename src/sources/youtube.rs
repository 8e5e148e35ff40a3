use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use url::Url;

use super::{AudioTrack, MediaKind, MediaSource, AUDIO_FILE_NAME};
use crate::config::{ResolverConfig, RESOLVER_KEY_ENV};
use crate::error::FacilitaError;
use crate::Result;

/// Characters allowed in a YouTube video id.
fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse an URL, retrying with an implied https scheme for bare
/// `youtube.com/...` input.
fn parse_lenient(input: &str) -> Option<Url> {
    Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{}", input)))
        .ok()
}

fn youtube_host(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    match host {
        "youtube.com" | "youtu.be" => Some(host.to_string()),
        _ => None,
    }
}

/// Check whether the input points at YouTube at all. The bare homepage does
/// not count; there has to be a path or query to carry a video.
pub fn is_valid_youtube_url(input: &str) -> bool {
    parse_lenient(input.trim())
        .map(|url| {
            youtube_host(&url).is_some() && (url.path() != "/" || url.query().is_some())
        })
        .unwrap_or(false)
}

/// Pull the video id out of a YouTube URL. Handles `watch?v=` links with the
/// parameter in any position and short `youtu.be/<id>` links; anything else
/// (playlists, channels, the homepage) yields `None`.
pub fn extract_video_id(input: &str) -> Option<String> {
    let url = parse_lenient(input.trim())?;
    let host = youtube_host(&url)?;

    let raw = match host.as_str() {
        "youtu.be" => url.path().trim_start_matches('/').to_string(),
        "youtube.com" if url.path() == "/watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?,
        _ => return None,
    };

    let id: String = raw.chars().take_while(|&c| is_id_char(c)).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Raw response from the MP3 resolver service.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// A download link the resolver vouched for.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub link: String,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub file_size: Option<u64>,
}

/// Decide whether a resolver response actually carries a usable link.
fn accept(video_id: &str, body: ResolveResponse) -> Result<ResolvedLink> {
    let status = body.status.as_deref().unwrap_or("");
    if status != "ok" {
        let reason = body.msg.filter(|msg| !msg.is_empty()).unwrap_or_else(|| {
            format!("resolver returned status '{}' for video {}", status, video_id)
        });
        return Err(FacilitaError::UnresolvedVideo(reason).into());
    }

    let link = body.link.unwrap_or_default();
    if link.is_empty() {
        return Err(FacilitaError::UnresolvedVideo(format!(
            "resolver returned no download link for video {}",
            video_id
        ))
        .into());
    }

    Ok(ResolvedLink {
        link,
        title: body.title.filter(|title| !title.is_empty()),
        duration: body.duration,
        file_size: body.filesize,
    })
}

/// Client for the third-party YouTube-to-MP3 resolver.
pub struct LinkResolver {
    client: Client,
    endpoint: String,
    api_host: String,
    api_key: String,
}

impl LinkResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            api_host: config.api_host.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Ask the resolver for a downloadable MP3 link for the video.
    pub async fn resolve(&self, video_id: &str) -> Result<ResolvedLink> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!(
                "RapidAPI key is not configured. Set resolver.api_key in the config file or the {} environment variable",
                RESOLVER_KEY_ENV
            );
        }

        tracing::debug!("Resolving audio link for video: {}", video_id);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id", video_id)])
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await
            .map_err(|err| {
                FacilitaError::UnresolvedVideo(format!("resolver request failed: {}", err))
            })?;

        if !response.status().is_success() {
            return Err(FacilitaError::UnresolvedVideo(format!(
                "resolver returned HTTP {} for video {}",
                response.status(),
                video_id
            ))
            .into());
        }

        let body: ResolveResponse = response.json().await.map_err(|err| {
            FacilitaError::UnresolvedVideo(format!("resolver response was not valid JSON: {}", err))
        })?;

        accept(video_id, body)
    }
}

/// Source for YouTube links, resolved to MP3 through the RapidAPI service
pub struct YoutubeSource {
    resolver: LinkResolver,
    client: Client,
}

impl YoutubeSource {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            resolver: LinkResolver::new(config),
            client: Client::new(),
        }
    }

    /// Stream the resolved MP3 into the job directory.
    async fn download(&self, resolved: &ResolvedLink, target: &Path) -> Result<u64> {
        tracing::info!("Downloading audio to: {}", target.display());

        let response = self.client.get(&resolved.link).send().await.map_err(|err| {
            FacilitaError::UnresolvedVideo(format!("audio download failed: {}", err))
        })?;

        if !response.status().is_success() {
            return Err(FacilitaError::UnresolvedVideo(format!(
                "download link returned HTTP {}",
                response.status()
            ))
            .into());
        }

        let total_size = response
            .content_length()
            .or(resolved.file_size)
            .unwrap_or(0);
        let progress = ProgressBar::new(total_size);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap(),
        );
        progress.set_message("Downloading audio...");

        let mut file = fs_err::File::create(target)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        use std::io::Write;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        progress.finish_with_message("Download complete");

        Ok(downloaded)
    }
}

#[async_trait]
impl MediaSource for YoutubeSource {
    fn supports(&self, input: &str) -> bool {
        // Claims every web URL; acquire() rejects the non-YouTube ones
        input.starts_with("http://")
            || input.starts_with("https://")
            || is_valid_youtube_url(input)
    }

    async fn acquire(&self, input: &str, work_dir: &Path) -> Result<AudioTrack> {
        if !is_valid_youtube_url(input) {
            return Err(FacilitaError::InvalidYoutubeUrl(input.to_string()).into());
        }

        let video_id = extract_video_id(input).ok_or_else(|| {
            FacilitaError::UnresolvedVideo(format!("could not find a video id in {}", input))
        })?;

        let resolved = self.resolver.resolve(&video_id).await?;

        let target = work_dir.join(AUDIO_FILE_NAME);
        let downloaded = self.download(&resolved, &target).await?;

        let title = resolved
            .title
            .clone()
            .or_else(|| title_from_link(&resolved.link));

        Ok(AudioTrack {
            path: target,
            title,
            duration: resolved.duration,
            file_size: Some(downloaded).filter(|&bytes| bytes > 0).or(resolved.file_size),
            kind: MediaKind::YoutubeLink,
            origin: input.to_string(),
        })
    }

    fn source_name(&self) -> &'static str {
        "YouTube"
    }
}

/// Fall back to the link's filename when the resolver sends no title.
fn title_from_link(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|filename| !filename.is_empty())
        .map(|filename| {
            let name = if let Some(dot_pos) = filename.rfind('.') {
                &filename[..dot_pos]
            } else {
                filename
            };
            urlencoding::decode(name)
                .unwrap_or_else(|_| name.into())
                .replace(['_', '-'], " ")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_youtube_urls() {
        let valid = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
            // Valid YouTube URLs even though no video id can be extracted
            "https://www.youtube.com/playlist?list=PL1234",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        ];
        for url in valid {
            assert!(is_valid_youtube_url(url), "should accept: {}", url);
        }
    }

    #[test]
    fn test_invalid_youtube_urls() {
        let invalid = [
            "https://vimeo.com/12345",
            "https://www.google.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com.evil.com/watch?v=dQw4w9WgXcQ",
            "ftp://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/",
            "https://youtu.be/",
            "not a url at all",
            "",
        ];
        for url in invalid {
            assert!(!is_valid_youtube_url(url), "should reject: {}", url);
        }
    }

    #[test]
    fn test_extract_video_id_from_watch_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        // v does not have to be the first parameter
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=abc_DEF-123"),
            Some("abc_DEF-123".to_string())
        );
        assert_eq!(
            extract_video_id("youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_from_short_urls() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=tracking"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_truncates_at_invalid_chars() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc def"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_misses() {
        assert_eq!(extract_video_id("https://www.youtube.com/playlist?list=PL1"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?list=PL1"), None);
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
    }

    #[test]
    fn test_accept_requires_ok_status() {
        let body = ResolveResponse {
            status: Some("fail".into()),
            link: Some("https://cdn.example.com/a.mp3".into()),
            title: None,
            duration: None,
            filesize: None,
            msg: Some("video too long".into()),
        };
        let err = accept("abc", body).unwrap_err();
        assert!(err.to_string().contains("video too long"));

        let body = ResolveResponse {
            status: None,
            link: None,
            title: None,
            duration: None,
            filesize: None,
            msg: None,
        };
        assert!(accept("abc", body).is_err());
    }

    #[test]
    fn test_accept_requires_link() {
        let body = ResolveResponse {
            status: Some("ok".into()),
            link: Some("".into()),
            title: None,
            duration: None,
            filesize: None,
            msg: None,
        };
        let err = accept("abc", body).unwrap_err();
        let err = err.downcast::<FacilitaError>().unwrap();
        assert!(matches!(err, FacilitaError::UnresolvedVideo(_)));
    }

    #[test]
    fn test_accept_passes_metadata_through() {
        let body = ResolveResponse {
            status: Some("ok".into()),
            link: Some("https://cdn.example.com/a.mp3".into()),
            title: Some("A Talk".into()),
            duration: Some(312.5),
            filesize: Some(780_000),
            msg: None,
        };
        let resolved = accept("abc", body).unwrap();
        assert_eq!(resolved.link, "https://cdn.example.com/a.mp3");
        assert_eq!(resolved.title.as_deref(), Some("A Talk"));
        assert_eq!(resolved.duration, Some(312.5));
        assert_eq!(resolved.file_size, Some(780_000));
    }

    #[test]
    fn test_resolve_response_tolerates_extra_fields() {
        let json = r#"{
            "link": "https://cdn.example.com/a.mp3",
            "title": "A Talk",
            "filesize": 780000,
            "progress": 0,
            "duration": 312.5,
            "status": "ok",
            "msg": "success"
        }"#;
        let body: ResolveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.status.as_deref(), Some("ok"));
        assert_eq!(body.filesize, Some(780_000));
    }

    #[tokio::test]
    async fn test_resolver_requires_api_key() {
        // Empty key fails before any request leaves the machine
        let resolver = LinkResolver::new(&ResolverConfig::default());
        let err = resolver.resolve("dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.to_string().contains(RESOLVER_KEY_ENV));
    }

    #[tokio::test]
    async fn test_acquire_rejects_non_youtube_urls() {
        let source = YoutubeSource::new(&ResolverConfig::default());
        let dir = tempfile::tempdir().unwrap();

        let err = source
            .acquire("https://vimeo.com/12345", dir.path())
            .await
            .unwrap_err();
        let err = err.downcast::<FacilitaError>().unwrap();
        assert!(matches!(err, FacilitaError::InvalidYoutubeUrl(_)));
    }

    #[tokio::test]
    async fn test_acquire_rejects_idless_youtube_urls() {
        let source = YoutubeSource::new(&ResolverConfig::default());
        let dir = tempfile::tempdir().unwrap();

        // Valid YouTube URL, but nothing to resolve. Fails before the
        // resolver is contacted.
        let err = source
            .acquire("https://www.youtube.com/playlist?list=PL1", dir.path())
            .await
            .unwrap_err();
        let err = err.downcast::<FacilitaError>().unwrap();
        assert!(matches!(err, FacilitaError::UnresolvedVideo(_)));
    }

    #[test]
    fn test_title_from_link() {
        assert_eq!(
            title_from_link("https://cdn.example.com/files/My_Talk%202024.mp3?sig=xyz"),
            Some("My Talk 2024".to_string())
        );
        assert_eq!(title_from_link("https://cdn.example.com/"), None);
    }
}
