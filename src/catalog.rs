use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use entity::prelude::Song;
use log::{error, info};

use crate::api::MusicBackend;

pub const NO_SONGS_FOR_GENRE: &str = "No songs found for the selected genre.";

/// The last-fetched song list. Every fetch replaces it wholesale.
#[derive(Debug, Default)]
pub struct CatalogStore {
    songs: Option<Vec<Song>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, songs: Vec<Song>) {
        self.songs = Some(songs);
    }

    /// Empty until the first successful fetch.
    pub fn songs(&self) -> &[Song] {
        self.songs.as_deref().unwrap_or(&[])
    }

    pub fn is_loaded(&self) -> bool {
        self.songs.is_some()
    }

    pub fn find(&self, id: &str) -> Option<&Song> {
        self.songs().iter().find(|song| song.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Genre(String),
}

impl GenreFilter {
    pub fn matches(&self, song: &Song) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::Genre(genre) => song.genre == *genre,
        }
    }
}

impl FromStr for GenreFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => GenreFilter::All,
            genre => GenreFilter::Genre(genre.to_string()),
        })
    }
}

impl fmt::Display for GenreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreFilter::All => f.write_str("All Genres"),
            GenreFilter::Genre(genre) => f.write_str(&genre_label(genre)),
        }
    }
}

/// Distinct genres in the order they first appear.
pub fn distinct_genres(songs: &[Song]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut genres = Vec::new();
    for song in songs {
        if seen.insert(song.genre.as_str()) {
            genres.push(song.genre.clone());
        }
    }
    genres
}

pub fn filter_by_genre(songs: &[Song], filter: &GenreFilter) -> Vec<Song> {
    songs.iter().filter(|song| filter.matches(song)).cloned().collect()
}

/// Display form of a genre: first character upper-cased, the rest untouched.
pub fn genre_label(genre: &str) -> String {
    let mut chars = genre.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The song list screen: one fetch on mount, then purely local filtering.
#[derive(Debug)]
pub struct CatalogView {
    genres: Vec<String>,
    selected: GenreFilter,
    filtered: Vec<Song>,
    error: Option<String>,
}

impl CatalogView {
    pub async fn mount(backend: &dyn MusicBackend, access_token: Option<&str>, store: &mut CatalogStore) -> Self {
        match backend.list_songs(access_token).await {
            Ok(songs) => {
                info!("Fetched {} songs", songs.len());
                let genres = distinct_genres(&songs);
                let filtered = songs.clone();
                store.replace(songs);
                Self {
                    genres,
                    selected: GenreFilter::All,
                    filtered,
                    error: None,
                }
            }
            Err(e) => {
                error!("Failed to load catalog: {}", e);
                Self {
                    genres: Vec::new(),
                    selected: GenreFilter::All,
                    filtered: Vec::new(),
                    error: Some(e.user_message()),
                }
            }
        }
    }

    pub fn select_genre(&mut self, store: &CatalogStore, filter: GenreFilter) {
        self.filtered = filter_by_genre(store.songs(), &filter);
        self.selected = filter;
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn selected(&self) -> &GenreFilter {
        &self.selected
    }

    pub fn songs(&self) -> &[Song] {
        &self.filtered
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Options of the genre selector: "All Genres" followed by every derived genre.
    pub fn genre_options(&self) -> Vec<GenreFilter> {
        std::iter::once(GenreFilter::All)
            .chain(self.genres.iter().cloned().map(GenreFilter::Genre))
            .collect()
    }
}
