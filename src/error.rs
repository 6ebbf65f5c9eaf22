use thiserror::Error;

/// Shown when the backend fails without telling us why.
pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Backend(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Media host error: {0}")]
    MediaHost(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Storage contains invalid data: {0}")]
    StorageFormat(#[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Audio error: {0}")]
    Audio(String),
}

impl ClientError {
    /// The message displayed inline next to the form or list that failed.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(message) | ClientError::Backend(message) => message.clone(),
            ClientError::Http(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}
