//! In-process stand-in for the catalog backend and the media host.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SongsMode {
    #[default]
    Ok,
    ServerError,
    Malformed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Behaviour {
    pub fail_cover_upload: bool,
    pub songs: SongsMode,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub route: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    behaviour: Behaviour,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockState {
    fn record(&self, route: &str, headers: &HeaderMap, body: &[u8]) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.calls.lock().unwrap().push(Call {
            route: route.to_string(),
            authorization,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }
}

pub struct MockServer {
    pub base_url: String,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockServer {
    pub async fn spawn(behaviour: Behaviour) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            behaviour,
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/users/register", post(register))
            .route("/users/login", post(login))
            .route("/songs/", get(list_songs).post(create_song))
            .route("/media/upload", post(upload_media))
            .route("/audio/:name", get(serve_audio))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/", addr),
            calls,
        }
    }

    pub fn media_url(&self) -> String {
        format!("{}media/upload", self.base_url)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.route).collect()
    }
}

fn auth_body(request: &Value) -> Value {
    json!({
        "user": {
            "_id": "u1",
            "name": request["name"].as_str().unwrap_or("Asha"),
            "email": request["email"],
        },
        "accessToken": "tok-abc",
        "message": "Welcome aboard",
    })
}

async fn register(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    state.record("POST /users/register", &headers, &body);
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    if request["email"] == "taken@example.com" {
        return (StatusCode::CONFLICT, Json(json!({ "message": "User already exists" }))).into_response();
    }
    (StatusCode::CREATED, Json(auth_body(&request))).into_response()
}

async fn login(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    state.record("POST /users/login", &headers, &body);
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    match request["password"].as_str() {
        Some("wrong-password") => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" }))).into_response(),
        Some(_) => Json(auth_body(&request)).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn song(id: &str, title: &str, genre: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "movieName": null,
        "albumName": "single",
        "genre": genre,
        "releaseYear": 2019,
        "coverImageUrl": format!("https://cdn.example/song_covers/{}.jpg", id),
        "songUrl": format!("https://cdn.example/songs/{}.mp3", id),
        "uploadedBy": "u1",
    })
}

async fn list_songs(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("GET /songs/", &headers, &[]);
    match state.behaviour.songs {
        SongsMode::Ok => Json(json!([
            song("s1", "Levitating", "pop"),
            song("s2", "Numb", "rock"),
            song("s3", "Peaches", "pop"),
        ]))
        .into_response(),
        SongsMode::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        SongsMode::Malformed => Json(json!([{ "_id": "s1", "title": 42 }])).into_response(),
    }
}

async fn create_song(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    state.record("POST /songs/", &headers, &body);
    let mut record: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    record["_id"] = json!("s-new");
    (StatusCode::CREATED, Json(record)).into_response()
}

pub const AUDIO_BYTES: &[u8] = b"ID3fake-mp3-frames";

async fn serve_audio(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record("GET /audio", &headers, &[]);
    ([(header::CONTENT_TYPE, "audio/mpeg")], AUDIO_BYTES).into_response()
}

async fn upload_media(State(state): State<MockState>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut folder = String::new();
    let mut preset = String::new();
    let mut file_name = String::new();
    let mut size = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().map(str::to_string).as_deref() {
            Some("folder") => folder = field.text().await.unwrap_or_default(),
            Some("upload_preset") => preset = field.text().await.unwrap_or_default(),
            Some("file") => {
                file_name = field.file_name().unwrap_or_default().to_string();
                size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
            }
            _ => {}
        }
    }

    let summary = format!("file={} size={} upload_preset={} folder={}", file_name, size, preset, folder);
    state.record(&format!("POST /media/upload {}", folder), &headers, summary.as_bytes());

    if folder == "song_covers" && state.behaviour.fail_cover_upload {
        return Json(json!({ "error": { "message": "Upload preset not found" } })).into_response();
    }
    Json(json!({ "secure_url": format!("https://cdn.example/{}/asset", folder) })).into_response()
}
