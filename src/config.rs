use std::env;
use std::path::PathBuf;

use log::LevelFilter;
use url::Url;

use crate::error::ClientError;

const DEFAULT_API_URL: &str = "https://music-streaming-backend-zs5a.onrender.com/";
const DEFAULT_AUTH_URL: &str = "http://localhost:5000/";
const DEFAULT_MEDIA_UPLOAD_URL: &str = "https://api.cloudinary.com/v1_1/dffr1kcqq/upload";
const DEFAULT_UPLOAD_PRESET: &str = "songs_uploaded";
const DEFAULT_COVER_FOLDER: &str = "song_covers";
const DEFAULT_AUDIO_FOLDER: &str = "songs";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub auth_url: Url,
    pub media_upload_url: Url,
    pub upload_preset: String,
    pub cover_folder: String,
    pub audio_folder: String,
    pub storage_path: PathBuf,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let storage_path = match lookup("RHYTHM_STORAGE_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_storage_path(),
        };

        let log_level = var("RHYTHM_LOG_LEVEL", "info")
            .parse()
            .map_err(|_| ClientError::Config("RHYTHM_LOG_LEVEL must be a log level".to_string()))?;

        Ok(Self {
            api_url: parse_base_url(&var("RHYTHM_API_URL", DEFAULT_API_URL))?,
            auth_url: parse_base_url(&var("RHYTHM_AUTH_URL", DEFAULT_AUTH_URL))?,
            media_upload_url: parse_url(&var("RHYTHM_MEDIA_UPLOAD_URL", DEFAULT_MEDIA_UPLOAD_URL))?,
            upload_preset: var("RHYTHM_UPLOAD_PRESET", DEFAULT_UPLOAD_PRESET),
            cover_folder: var("RHYTHM_COVER_FOLDER", DEFAULT_COVER_FOLDER),
            audio_folder: var("RHYTHM_AUDIO_FOLDER", DEFAULT_AUDIO_FOLDER),
            storage_path,
            log_level,
        })
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rhythm")
        .join("storage.json")
}

fn parse_url(raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw).map_err(|e| ClientError::Config(format!("invalid URL {}: {}", raw, e)))
}

/// Base URLs get a trailing slash so `Url::join` appends instead of replacing the last segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    if raw.ends_with('/') {
        parse_url(raw)
    } else {
        parse_url(&format!("{}/", raw))
    }
}
