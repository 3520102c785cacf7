use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{Context, eyre};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "photo-uploader";

const DEFAULT_CONFIG: &str = r#"# Directory watched for new images
watch_directory = "~/Pictures/photo-uploader/incoming"

# Uploaded images are moved here
archive_directory = "~/Pictures/photo-uploader/uploaded"

# Album that receives every upload; created if it does not exist
album_title = "Uploads"

# OAuth client secrets downloaded from the Google Cloud console
# client_secrets = "~/.config/photo-uploader/credentials.json"

# Where the access/refresh token is kept between runs
# token_file = "~/.config/photo-uploader/token.json"

# poll_interval_secs = 5
# request_timeout_secs = 30

# Loopback port for the authorization redirect (0 picks a free port)
# redirect_port = 8085
"#;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    watch_directory: String,
    archive_directory: String,
    album_title: String,
    #[serde(default)]
    client_secrets: Option<String>,
    #[serde(default)]
    token_file: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_redirect_port")]
    redirect_port: u16,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_redirect_port() -> u16 {
    8085
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.album_title.trim().is_empty() {
            return Err(eyre!("album_title must not be empty"));
        }
        if config.poll_interval_secs == 0 {
            return Err(eyre!("poll_interval_secs must be at least 1"));
        }
        Ok(config)
    }

    /// Directory holding the config file, client secrets and token
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIR))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or(eyre!("No config directory on this platform"))?;

        Self::from_file(&config_path)
    }

    /// Write the template config, leaving an existing file untouched
    pub fn create_default() -> Result<PathBuf> {
        let config_path = Self::config_path().ok_or(eyre!("No config directory on this platform"))?;
        Self::write_default(&config_path)?;
        Ok(config_path)
    }

    fn write_default(config_path: &Path) -> Result<bool> {
        if config_path.exists() {
            log::info!("Config already exists at {}", config_path.display());
            return Ok(false);
        }
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(true)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    fn in_config_dir(file_name: &str) -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(file_name)
    }

    pub fn watch_directory(&self) -> PathBuf {
        Self::expand_path(&self.watch_directory)
    }

    pub fn archive_directory(&self) -> PathBuf {
        Self::expand_path(&self.archive_directory)
    }

    pub fn album_title(&self) -> &str {
        &self.album_title
    }

    pub fn client_secrets_path(&self) -> PathBuf {
        match &self.client_secrets {
            Some(path) => Self::expand_path(path),
            None => Self::in_config_dir("credentials.json"),
        }
    }

    pub fn token_path(&self) -> PathBuf {
        match &self.token_file {
            Some(path) => Self::expand_path(path),
            None => Self::in_config_dir("token.json"),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn redirect_port(&self) -> u16 {
        self.redirect_port
    }
}
