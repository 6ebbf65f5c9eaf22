use serde::{Deserialize, Serialize};

/// Album name used for tracks that were not released as part of an album.
pub const SINGLE_ALBUM: &str = "single";

fn single_album() -> String {
    SINGLE_ALBUM.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub movie_name: Option<String>,
    #[serde(default = "single_album")]
    pub album_name: String,
    pub genre: String,
    pub release_year: i32,
    pub cover_image_url: String,
    pub song_url: String,
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

impl Song {
    /// Second line of a song card: the movie it belongs to, or "Single".
    pub fn origin_label(&self) -> String {
        match self.movie_name.as_deref() {
            Some(movie) if !movie.is_empty() && movie != SINGLE_ALBUM => format!("Movie: {}", movie),
            _ => "Single".to_string(),
        }
    }
}

/// Metadata record submitted once both media assets are hosted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub title: String,
    pub movie_name: Option<String>,
    pub album_name: String,
    pub genre: String,
    pub release_year: i32,
    pub cover_image_url: String,
    pub song_url: String,
    pub uploaded_by: Option<String>,
}
