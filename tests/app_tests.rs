mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{Behaviour, MockServer, SongsMode, AUDIO_BYTES};
use reqwest::Client;
use serde_json::Value;

use rhythm_client::api::{HttpBackend, MusicBackend};
use rhythm_client::auth::{LoginForm, SignupForm, PASSWORD_TOO_SHORT};
use rhythm_client::catalog::GenreFilter;
use rhythm_client::config::{parse_base_url, Config};
use entity::prelude::Song;
use rhythm_client::media::{HttpMediaHost, MediaFile, MediaHost, UploadProgress};
use rhythm_client::routes::{Navigation, Route};
use rhythm_client::session::{ACCESS_TOKEN_KEY, USER_KEY};
use rhythm_client::storage::{FileStorage, LocalStorage, MemoryStorage};
use rhythm_client::upload::{UploadForm, UploadOutcome, UploadSettings, MEDIA_UPLOAD_FAILED};
use rhythm_client::{AppState, ClientError};

fn app_for(server: &MockServer, storage: Box<dyn LocalStorage>) -> AppState {
    let client = Client::new();
    let base = parse_base_url(&server.base_url).unwrap();
    let media_url = server.media_url().parse().unwrap();
    AppState::new(
        client.clone(),
        storage,
        Arc::new(HttpBackend::new(client.clone(), base.clone(), base)),
        Arc::new(HttpMediaHost::new(client, media_url, "songs_uploaded")),
        UploadSettings {
            reset_delay: Duration::ZERO,
            ..UploadSettings::default()
        },
    )
}

fn config_for(server: &MockServer, storage_path: &std::path::Path) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("RHYTHM_API_URL", server.base_url.clone()),
        ("RHYTHM_AUTH_URL", server.base_url.clone()),
        ("RHYTHM_MEDIA_UPLOAD_URL", server.media_url()),
        ("RHYTHM_STORAGE_PATH", storage_path.display().to_string()),
    ]);
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn login_form() -> LoginForm {
    LoginForm {
        email: "asha@example.com".to_string(),
        password: "correct-horse".to_string(),
    }
}

#[tokio::test]
async fn short_signup_password_never_reaches_backend() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let mut app = app_for(&server, Box::new(MemoryStorage::new()));

    let err = app
        .signup(&SignupForm {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "1234567".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(err.user_message(), PASSWORD_TOO_SHORT);
    assert!(server.calls().is_empty());
    assert!(!app.session.is_authenticated());
}

#[tokio::test]
async fn signup_stores_session_and_surfaces_message() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let storage = Arc::new(MemoryStorage::new());
    let mut app = app_for(&server, Box::new(storage.clone()));

    let message = app
        .signup(&SignupForm {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "12345678".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(message, "Welcome aboard");
    assert_eq!(server.routes(), vec!["POST /users/register"]);
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-abc"));
    assert_eq!(app.session.user().unwrap().id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn backend_messages_are_verbatim() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let mut app = app_for(&server, Box::new(MemoryStorage::new()));

    let err = app
        .signup(&SignupForm {
            name: "Asha".to_string(),
            email: "taken@example.com".to_string(),
            password: "12345678".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "User already exists");

    let err = app
        .login(&LoginForm {
            email: "asha@example.com".to_string(),
            password: "wrong-password".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(!app.session.is_authenticated());
}

#[tokio::test]
async fn login_persists_and_logout_clears_durable_storage() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let storage_path = dir.path().join("storage.json");
    let config = config_for(&server, &storage_path);

    let mut app = AppState::from_config(&config).unwrap();
    app.login(&login_form()).await.unwrap();

    let on_disk = FileStorage::open(&storage_path);
    assert_eq!(on_disk.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-abc"));
    let user: Value = serde_json::from_str(&on_disk.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(user["email"], "asha@example.com");

    let restored = AppState::from_config(&config).unwrap();
    assert_eq!(restored.session.access_token(), Some("tok-abc"));
    assert_eq!(restored.navigate(Route::Songs), Navigation::Render(Route::Songs));

    assert_eq!(app.logout().unwrap(), "logged out successfully");
    let on_disk = FileStorage::open(&storage_path);
    assert_eq!(on_disk.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(on_disk.get(USER_KEY), None);
    assert_eq!(app.navigate(Route::SongUpload), Navigation::Redirect(Route::Login));
}

#[tokio::test]
async fn catalog_fetch_derives_genres_and_filters() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let mut app = app_for(&server, Box::new(MemoryStorage::new()));
    app.login(&login_form()).await.unwrap();

    let mut view = app.open_catalog().await;
    assert_eq!(view.error(), None);
    assert_eq!(view.genres(), ["pop", "rock"]);
    assert_eq!(app.catalog.songs().len(), 3);

    view.select_genre(&app.catalog, GenreFilter::Genre("pop".to_string()));
    let titles: Vec<&str> = view.songs().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Levitating", "Peaches"]);

    view.select_genre(&app.catalog, GenreFilter::Genre("Pop".to_string()));
    assert!(view.songs().is_empty());

    view.select_genre(&app.catalog, GenreFilter::All);
    assert_eq!(view.songs(), app.catalog.songs());

    let listing = server.calls().into_iter().find(|c| c.route == "GET /songs/").unwrap();
    assert_eq!(listing.authorization.as_deref(), Some("Bearer tok-abc"));
}

#[tokio::test]
async fn catalog_failure_shows_message_without_retry() {
    let server = MockServer::spawn(Behaviour {
        songs: SongsMode::ServerError,
        ..Behaviour::default()
    })
    .await;
    let mut app = app_for(&server, Box::new(MemoryStorage::new()));

    let view = app.open_catalog().await;
    assert_eq!(view.error(), Some("Failed to fetch songs"));
    assert!(view.songs().is_empty());
    assert_eq!(server.routes(), vec!["GET /songs/"]);
}

#[tokio::test]
async fn malformed_listing_is_a_parse_error() {
    let server = MockServer::spawn(Behaviour {
        songs: SongsMode::Malformed,
        ..Behaviour::default()
    })
    .await;
    let base = parse_base_url(&server.base_url).unwrap();
    let backend = HttpBackend::new(Client::new(), base.clone(), base);

    let err = backend.list_songs(None).await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}

struct UploadFiles {
    _dir: tempfile::TempDir,
    form: UploadForm,
}

fn upload_files() -> UploadFiles {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    let track = dir.path().join("track.mp3");
    std::fs::write(&cover, vec![1u8; 4096]).unwrap();
    std::fs::write(&track, vec![2u8; 200 * 1024]).unwrap();

    UploadFiles {
        _dir: dir,
        form: UploadForm {
            title: "Blinding Lights".to_string(),
            movie_name: String::new(),
            album_name: String::new(),
            genre: "synthpop".to_string(),
            release_year: Some(2019),
            cover_image: Some(cover),
            song_file: Some(track),
        },
    }
}

#[tokio::test]
async fn upload_hosts_media_then_submits_metadata() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let mut app = app_for(&server, Box::new(MemoryStorage::new()));
    app.login(&login_form()).await.unwrap();
    let mut files = upload_files();

    let outcome = app.upload(&mut files.form).await.unwrap();
    let song = match outcome {
        UploadOutcome::Published(song) => song,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(song.id, "s-new");
    assert_eq!(song.album_name, "single");
    assert_eq!(files.form, UploadForm::default());
    assert_eq!(app.uploads().progress().get(), 0);

    assert_eq!(
        server.routes(),
        vec![
            "POST /users/login",
            "POST /media/upload song_covers",
            "POST /media/upload songs",
            "POST /songs/",
        ]
    );

    let calls = server.calls();
    let cover_call = &calls[1];
    assert!(cover_call.body.contains("songs_uploaded"));
    assert!(cover_call.body.contains("cover.png"));

    let submit = &calls[3];
    assert_eq!(submit.authorization.as_deref(), Some("Bearer tok-abc"));
    let record: Value = serde_json::from_str(&submit.body).unwrap();
    assert_eq!(record["coverImageUrl"], "https://cdn.example/song_covers/asset");
    assert_eq!(record["songUrl"], "https://cdn.example/songs/asset");
    assert_eq!(record["movieName"], Value::Null);
    assert_eq!(record["uploadedBy"], "u1");
    assert_eq!(record["releaseYear"], 2019);
}

#[tokio::test]
async fn failed_cover_upload_aborts_before_metadata() {
    let server = MockServer::spawn(Behaviour {
        fail_cover_upload: true,
        ..Behaviour::default()
    })
    .await;
    let mut app = app_for(&server, Box::new(MemoryStorage::new()));
    app.login(&login_form()).await.unwrap();
    let mut files = upload_files();

    let outcome = app.upload(&mut files.form).await.unwrap();
    assert_eq!(outcome, UploadOutcome::MediaFailed);
    assert_eq!(outcome.notice(), MEDIA_UPLOAD_FAILED);
    assert!(!server.routes().iter().any(|r| r == "POST /songs/"));
    assert_eq!(files.form.title, "Blinding Lights");
    assert!(!app.uploads().is_busy());
}

#[tokio::test]
async fn media_host_reports_byte_progress_and_folder() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let host = HttpMediaHost::new(Client::new(), server.media_url().parse().unwrap(), "songs_uploaded");
    let progress = UploadProgress::new();
    let file = MediaFile::new("song_covers_remix.mp3", vec![3u8; 300 * 1024]);
    assert_eq!(progress.get(), 0);

    let url = host.upload(&file, "songs", &progress).await.unwrap();
    assert_eq!(url, "https://cdn.example/songs/asset");
    assert_eq!(progress.get(), 100);

    let calls = server.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].route, "POST /media/upload songs");
    assert_eq!(
        calls[0].body,
        "file=song_covers_remix.mp3 size=307200 upload_preset=songs_uploaded folder=songs"
    );
}

#[tokio::test]
async fn audio_is_fetched_with_the_shared_client() {
    let server = MockServer::spawn(Behaviour::default()).await;
    let app = app_for(&server, Box::new(MemoryStorage::new()));
    let song = Song {
        id: "s1".to_string(),
        title: "Levitating".to_string(),
        movie_name: None,
        album_name: "single".to_string(),
        genre: "pop".to_string(),
        release_year: 2020,
        cover_image_url: format!("{}covers/s1.jpg", server.base_url),
        song_url: format!("{}audio/s1.mp3", server.base_url),
        uploaded_by: None,
    };

    let bytes = app.fetch_audio(&song).await.unwrap();
    assert_eq!(&bytes[..], AUDIO_BYTES);
    assert_eq!(server.routes(), vec!["GET /audio"]);
}
