use async_trait::async_trait;
use entity::prelude::{AuthResponse, ErrorBody, LoginRequest, NewSong, RegisterRequest, Song};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, GENERIC_FAILURE};

const REGISTER_PATH: &str = "users/register";
const LOGIN_PATH: &str = "users/login";
const SONGS_PATH: &str = "songs/";

/// Shown when the listing endpoint answers with a non-success status.
pub const FETCH_SONGS_FAILED: &str = "Failed to fetch songs";

/// The catalog and account backend.
#[async_trait]
pub trait MusicBackend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError>;

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError>;

    async fn list_songs(&self, access_token: Option<&str>) -> Result<Vec<Song>, ClientError>;

    async fn create_song(&self, song: &NewSong, access_token: Option<&str>) -> Result<Song, ClientError>;
}

pub struct HttpBackend {
    client: Client,
    api_url: Url,
    auth_url: Url,
}

impl HttpBackend {
    pub fn new(client: Client, api_url: Url, auth_url: Url) -> Self {
        Self {
            client,
            api_url,
            auth_url,
        }
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
        base.join(path)
            .map_err(|e| ClientError::Config(format!("cannot build endpoint {}: {}", path, e)))
    }

    fn authorize(request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        match access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turns a non-success response into the backend's own message when it sent one.
    async fn backend_error(response: Response, fallback: &str) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| fallback.to_string());
        warn!("Backend responded {}: {}", status, message);
        ClientError::Backend(message)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(ClientError::Parse)
    }

    async fn authenticate<B: serde::Serialize + Sync>(&self, path: &str, body: &B) -> Result<AuthResponse, ClientError> {
        let url = Self::endpoint(&self.auth_url, path)?;
        debug!("POST {}", url);

        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response, GENERIC_FAILURE).await);
        }
        Self::parse(response).await
    }
}

#[async_trait]
impl MusicBackend for HttpBackend {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.authenticate(REGISTER_PATH, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.authenticate(LOGIN_PATH, request).await
    }

    async fn list_songs(&self, access_token: Option<&str>) -> Result<Vec<Song>, ClientError> {
        let url = Self::endpoint(&self.api_url, SONGS_PATH)?;
        debug!("GET {}", url);

        let response = Self::authorize(self.client.get(url), access_token).send().await?;
        if !response.status().is_success() {
            warn!("Song listing failed with status {}", response.status());
            return Err(ClientError::Backend(FETCH_SONGS_FAILED.to_string()));
        }
        Self::parse(response).await
    }

    async fn create_song(&self, song: &NewSong, access_token: Option<&str>) -> Result<Song, ClientError> {
        let url = Self::endpoint(&self.api_url, SONGS_PATH)?;
        debug!("POST {} ({})", url, song.title);

        let response = Self::authorize(self.client.post(url), access_token)
            .json(song)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response, GENERIC_FAILURE).await);
        }
        Self::parse(response).await
    }
}
