pub mod api;
pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logger;
pub mod media;
pub mod player;
pub mod routes;
pub mod session;
pub mod storage;
pub mod upload;

#[cfg(feature = "audio")]
pub mod audio;

pub use app::AppState;
pub use error::ClientError;
