use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Hosted Facilita AI API.
pub const DEFAULT_API_BASE_URL: &str = "https://facilita-ai-api.onrender.com";

/// RapidAPI YouTube-to-MP3 resolver.
pub const DEFAULT_RESOLVER_ENDPOINT: &str = "https://youtube-mp36.p.rapidapi.com/dl";
pub const DEFAULT_RESOLVER_HOST: &str = "youtube-mp36.p.rapidapi.com";

/// Environment variable that overrides `resolver.api_key`.
pub const RESOLVER_KEY_ENV: &str = "FACILITA_RAPIDAPI_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcription API settings
    pub api: ApiConfig,

    /// YouTube link resolver settings
    pub resolver: ResolverConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Facilita AI API
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Resolver endpoint that turns a video id into an MP3 link
    pub endpoint: String,

    /// Value for the X-RapidAPI-Host header
    pub api_host: String,

    /// RapidAPI key; usually supplied via the environment instead
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Temporary directory for job files
    pub temp_dir: Option<PathBuf>,

    /// Keep the converted audio file after transcription
    pub keep_audio: bool,

    /// Default output format
    pub default_output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
            },
            resolver: ResolverConfig::default(),
            app: AppConfig {
                temp_dir: None,
                keep_audio: false,
                default_output_format: "text".to_string(),
            },
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RESOLVER_ENDPOINT.to_string(),
            api_host: DEFAULT_RESOLVER_HOST.to_string(),
            api_key: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let mut config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.apply_env();
            config.validate()?;
            Ok(config)
        } else {
            // Persist the defaults before the env override so the key is
            // never written to disk
            let mut config = Self::default();
            config.save().await?;
            config.apply_env();
            Ok(config)
        }
    }

    /// Environment beats the config file for the resolver key.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(RESOLVER_KEY_ENV) {
            if !key.trim().is_empty() {
                self.resolver.api_key = key;
            }
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("facilita").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api.base_url", &self.api.base_url),
            ("resolver.endpoint", &self.resolver.endpoint),
        ] {
            let url = Url::parse(value)
                .with_context(|| format!("{} is not a valid URL: {}", name, value))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("{} must use HTTP or HTTPS: {}", name, value);
            }
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API Base URL: {}", self.api.base_url);
        println!("  Resolver Endpoint: {}", self.resolver.endpoint);
        println!("  Resolver Host: {}", self.resolver.api_host);
        let key_state = if self.resolver.api_key.trim().is_empty() {
            "(not set)"
        } else {
            "(set)"
        };
        println!("  Resolver API Key: {}", key_state);
        println!("  Keep Audio: {}", self.app.keep_audio);
        println!("  Default Format: {}", self.app.default_output_format);
    }
}
