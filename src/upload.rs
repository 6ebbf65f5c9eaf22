use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use entity::prelude::{NewSong, Song, SINGLE_ALBUM};
use log::{error, info};

use crate::api::MusicBackend;
use crate::error::ClientError;
use crate::media::{has_mime_type, MediaFile, MediaHost, UploadProgress};
use crate::session::SessionStore;

pub const UPLOAD_SUCCEEDED: &str = "Song uploaded successfully!";
pub const MEDIA_UPLOAD_FAILED: &str = "File upload failed. Please try again.";
pub const SUBMIT_FAILED: &str = "Failed to upload song.";

const EARLIEST_RELEASE_YEAR: i32 = 1900;
const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(1);

/// Fields of the upload form as entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub title: String,
    pub movie_name: String,
    pub album_name: String,
    pub genre: String,
    pub release_year: Option<i32>,
    pub cover_image: Option<PathBuf>,
    pub song_file: Option<PathBuf>,
}

impl UploadForm {
    /// Checks everything the form itself can check; no network involved.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Title is required".to_string()));
        }
        if self.genre.trim().is_empty() {
            return Err(ClientError::Validation("Genre is required".to_string()));
        }

        let current_year = chrono::Utc::now().year();
        match self.release_year {
            Some(year) if (EARLIEST_RELEASE_YEAR..=current_year).contains(&year) => {}
            Some(_) => {
                return Err(ClientError::Validation(format!(
                    "Release year must be between {} and {}",
                    EARLIEST_RELEASE_YEAR, current_year
                )))
            }
            None => return Err(ClientError::Validation("Release year is required".to_string())),
        }

        match &self.cover_image {
            Some(path) if has_mime_type(path, "image") => {}
            Some(_) => return Err(ClientError::Validation("Cover image must be an image file".to_string())),
            None => return Err(ClientError::Validation("Cover image is required".to_string())),
        }
        match &self.song_file {
            Some(path) if has_mime_type(path, "audio") => {}
            Some(_) => return Err(ClientError::Validation("Song file must be an audio file".to_string())),
            None => return Err(ClientError::Validation("Song file is required".to_string())),
        }
        Ok(())
    }

    /// The metadata record referencing the hosted assets, with the form's defaults applied.
    pub fn to_new_song(&self, cover_image_url: String, song_url: String, uploaded_by: Option<String>) -> NewSong {
        let movie_name = self.movie_name.trim();
        let album_name = self.album_name.trim();
        NewSong {
            title: self.title.trim().to_string(),
            movie_name: (!movie_name.is_empty()).then(|| movie_name.to_string()),
            album_name: if album_name.is_empty() {
                SINGLE_ALBUM.to_string()
            } else {
                album_name.to_string()
            },
            genre: self.genre.trim().to_string(),
            release_year: self.release_year.unwrap_or_default(),
            cover_image_url,
            song_url,
            uploaded_by,
        }
    }

    pub fn reset(&mut self) {
        *self = UploadForm::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Both assets hosted and the metadata record accepted.
    Published(Song),
    /// The media host failed; nothing was submitted to the catalog.
    MediaFailed,
    /// Assets are hosted but the catalog rejected the record.
    SubmitFailed(String),
}

impl UploadOutcome {
    /// The notification shown to the user.
    pub fn notice(&self) -> &'static str {
        match self {
            UploadOutcome::Published(_) => UPLOAD_SUCCEEDED,
            UploadOutcome::MediaFailed => MEDIA_UPLOAD_FAILED,
            UploadOutcome::SubmitFailed(_) => SUBMIT_FAILED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Published(_))
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub cover_folder: String,
    pub audio_folder: String,
    pub reset_delay: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            cover_folder: "song_covers".to_string(),
            audio_folder: "songs".to_string(),
            reset_delay: DEFAULT_RESET_DELAY,
        }
    }
}

/// Clears the in-flight flag however the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Publishes a song: cover image, then audio file, then the metadata record.
pub struct UploadWorkflow {
    media: Arc<dyn MediaHost>,
    backend: Arc<dyn MusicBackend>,
    settings: UploadSettings,
    progress: UploadProgress,
    in_flight: AtomicBool,
}

impl UploadWorkflow {
    pub fn new(media: Arc<dyn MediaHost>, backend: Arc<dyn MusicBackend>, settings: UploadSettings) -> Self {
        Self {
            media,
            backend,
            settings,
            progress: UploadProgress::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn progress(&self) -> &UploadProgress {
        &self.progress
    }

    /// Whether the submit control should be disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn submit(&self, form: &mut UploadForm, session: &SessionStore) -> Result<UploadOutcome, ClientError> {
        form.validate()?;
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ClientError::UploadInProgress);
        }
        let _guard = InFlight(&self.in_flight);
        self.progress.set(0);

        let (cover_path, song_path) = match (&form.cover_image, &form.song_file) {
            (Some(cover), Some(song)) => (cover.clone(), song.clone()),
            _ => return Err(ClientError::Validation("Both files are required".to_string())),
        };

        let cover_image_url = match self.host(&cover_path, &self.settings.cover_folder).await {
            Some(url) => url,
            None => return Ok(UploadOutcome::MediaFailed),
        };
        let song_url = match self.host(&song_path, &self.settings.audio_folder).await {
            Some(url) => url,
            None => return Ok(UploadOutcome::MediaFailed),
        };

        let uploaded_by = session.user().and_then(|user| user.id.clone());
        let record = form.to_new_song(cover_image_url, song_url, uploaded_by);

        match self.backend.create_song(&record, session.access_token()).await {
            Ok(song) => {
                info!("Song uploaded: {} ({})", song.title, song.id);
                self.progress.set(100);
                tokio::time::sleep(self.settings.reset_delay).await;
                form.reset();
                self.progress.set(0);
                Ok(UploadOutcome::Published(song))
            }
            Err(e) => {
                error!("Upload error: {}", e);
                Ok(UploadOutcome::SubmitFailed(e.user_message()))
            }
        }
    }

    /// Reads and hosts one file. Any failure is logged and reported as `None`.
    async fn host(&self, path: &Path, folder: &str) -> Option<String> {
        let file = match MediaFile::read(path).await {
            Ok(file) => file,
            Err(e) => {
                error!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };
        match self.media.upload(&file, folder, &self.progress).await {
            Ok(url) => Some(url),
            Err(e) => {
                error!("Media host upload error for {}: {}", path.display(), e);
                None
            }
        }
    }
}
