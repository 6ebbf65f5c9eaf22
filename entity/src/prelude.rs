pub use super::song::{NewSong, Song, SINGLE_ALBUM};
pub use super::user::{AuthResponse, ErrorBody, LoginRequest, RegisterRequest, User};
