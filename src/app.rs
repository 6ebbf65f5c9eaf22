use std::sync::Arc;

use bytes::Bytes;
use entity::prelude::Song;
use log::{debug, info};
use reqwest::Client;

use crate::api::{HttpBackend, MusicBackend};
use crate::auth::{LoginForm, SignupForm};
use crate::catalog::{CatalogStore, CatalogView};
use crate::config::Config;
use crate::error::ClientError;
use crate::media::{HttpMediaHost, MediaHost};
use crate::routes::{guard, nav_items, NavItem, Navigation, Route};
use crate::session::SessionStore;
use crate::storage::{FileStorage, LocalStorage};
use crate::upload::{UploadForm, UploadOutcome, UploadSettings, UploadWorkflow};

pub const LOGGED_OUT: &str = "logged out successfully";
const SIGNED_UP: &str = "Account created successfully";
const LOGGED_IN: &str = "Logged in successfully";

/// Root application state. Owns the session and catalog stores and the service clients; every
/// screen borrows from here.
pub struct AppState {
    pub session: SessionStore,
    pub catalog: CatalogStore,
    client: Client,
    backend: Arc<dyn MusicBackend>,
    uploads: UploadWorkflow,
}

impl AppState {
    /// Restores the session from `storage` and wires the workflow to the given services. `client`
    /// is kept for requests made outside the backend, such as fetching audio.
    pub fn new(
        client: Client,
        storage: Box<dyn LocalStorage>,
        backend: Arc<dyn MusicBackend>,
        media: Arc<dyn MediaHost>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            session: SessionStore::init(storage),
            catalog: CatalogStore::new(),
            uploads: UploadWorkflow::new(media, backend.clone(), settings),
            client,
            backend,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        let backend = HttpBackend::new(client.clone(), config.api_url.clone(), config.auth_url.clone());
        let media = HttpMediaHost::new(client.clone(), config.media_upload_url.clone(), config.upload_preset.clone());
        let storage = FileStorage::open(config.storage_path.clone());
        info!("Using storage at {}", storage.path().display());

        Ok(Self::new(
            client,
            Box::new(storage),
            Arc::new(backend),
            Arc::new(media),
            UploadSettings {
                cover_folder: config.cover_folder.clone(),
                audio_folder: config.audio_folder.clone(),
                ..UploadSettings::default()
            },
        ))
    }

    pub fn navigate(&self, route: Route) -> Navigation {
        guard(route, &self.session)
    }

    pub fn nav_items(&self) -> Vec<NavItem> {
        nav_items(&self.session)
    }

    /// Registers the account and stores the session. Returns the backend's greeting.
    pub async fn signup(&mut self, form: &SignupForm) -> Result<String, ClientError> {
        let request = form.validate()?;
        let response = self.backend.register(&request).await?;
        self.session.set(response.user, response.access_token)?;
        Ok(response.message.unwrap_or_else(|| SIGNED_UP.to_string()))
    }

    pub async fn login(&mut self, form: &LoginForm) -> Result<String, ClientError> {
        let request = form.validate()?;
        let response = self.backend.login(&request).await?;
        self.session.set(response.user, response.access_token)?;
        Ok(response.message.unwrap_or_else(|| LOGGED_IN.to_string()))
    }

    pub fn logout(&mut self) -> Result<&'static str, ClientError> {
        self.session.logout()?;
        Ok(LOGGED_OUT)
    }

    /// Mounts the song list screen, fetching the catalog once.
    pub async fn open_catalog(&mut self) -> CatalogView {
        CatalogView::mount(self.backend.as_ref(), self.session.access_token(), &mut self.catalog).await
    }

    pub async fn upload(&self, form: &mut UploadForm) -> Result<UploadOutcome, ClientError> {
        self.uploads.submit(form, &self.session).await
    }

    pub fn uploads(&self) -> &UploadWorkflow {
        &self.uploads
    }

    /// Downloads a track's audio through the shared client.
    pub async fn fetch_audio(&self, song: &Song) -> Result<Bytes, ClientError> {
        debug!("Fetching audio for {} from {}", song.title, song.song_url);
        let response = self.client.get(&song.song_url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}
