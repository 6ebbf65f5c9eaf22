use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use tokio::sync::watch;
use url::Url;

use crate::error::ClientError;

const CHUNK_SIZE: usize = 64 * 1024;

/// A single upload percentage shared by every request of a workflow. Each request overwrites it.
#[derive(Clone)]
pub struct UploadProgress {
    sender: watch::Sender<u8>,
}

impl UploadProgress {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    pub fn set(&self, percent: u8) {
        self.sender.send_replace(percent.min(100));
    }

    /// Records `loaded` out of `total` bytes as a rounded percentage.
    pub fn report(&self, loaded: u64, total: u64) {
        self.set(percent_completed(loaded, total));
    }

    pub fn get(&self) -> u8 {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.sender.subscribe()
    }
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub fn percent_completed(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((loaded as f64 * 100.0 / total as f64).round() as u64).min(100) as u8
}

/// A local file on its way to the media host.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub content: Bytes,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            mime_type,
            content: content.into(),
        }
    }

    pub async fn read(path: &Path) -> Result<Self, ClientError> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, content))
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Whether `path` guesses to a MIME type under `top_level` (e.g. "image", "audio").
pub fn has_mime_type(path: &Path, top_level: &str) -> bool {
    mime_guess::from_path(path)
        .iter()
        .any(|mime| mime.type_().as_str() == top_level)
}

/// Third-party host that stores media and hands back a public URL.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Uploads `file` into `folder` and returns its secure URL.
    async fn upload(&self, file: &MediaFile, folder: &str, progress: &UploadProgress) -> Result<String, ClientError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

pub struct HttpMediaHost {
    client: Client,
    upload_url: Url,
    upload_preset: String,
}

impl HttpMediaHost {
    pub fn new(client: Client, upload_url: Url, upload_preset: impl Into<String>) -> Self {
        Self {
            client,
            upload_url,
            upload_preset: upload_preset.into(),
        }
    }

    /// Streams the file in chunks so progress follows the bytes handed to the connection.
    fn progress_body(file: &MediaFile, progress: &UploadProgress) -> Body {
        let total = file.len();
        let progress = progress.clone();
        let chunks: Vec<Bytes> = file
            .content
            .chunks(CHUNK_SIZE)
            .map(|chunk| file.content.slice_ref(chunk))
            .collect();

        let mut loaded = 0u64;
        let stream = stream::iter(chunks.into_iter().map(move |chunk| {
            loaded += chunk.len() as u64;
            progress.report(loaded, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));
        Body::wrap_stream(stream)
    }
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, file: &MediaFile, folder: &str, progress: &UploadProgress) -> Result<String, ClientError> {
        debug!("Uploading {} ({} bytes) to folder {}", file.file_name, file.len(), folder);

        let part = Part::stream_with_length(Self::progress_body(file, progress), file.len())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Media upload request failed: {}", e);
                ClientError::MediaHost(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Media host responded {}: {}", status, body);
            return Err(ClientError::MediaHost(format!("upload rejected with status {}", status)));
        }

        let parsed: UploadResponse = serde_json::from_str(&body).map_err(ClientError::Parse)?;
        match parsed.secure_url {
            Some(url) => {
                debug!("Hosted {} at {}", file.file_name, url);
                Ok(url)
            }
            None => Err(ClientError::MediaHost("response carried no secure_url".to_string())),
        }
    }
}
