use entity::prelude::User;
use log::{debug, error};

use crate::error::ClientError;
use crate::storage::LocalStorage;

pub const USER_KEY: &str = "user";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// The authenticated user and bearer credential, mirrored to durable storage.
pub struct SessionStore {
    user: Option<User>,
    access_token: Option<String>,
    storage: Box<dyn LocalStorage>,
}

impl SessionStore {
    /// Restores whatever session the storage holds. A `user` entry that no longer parses is
    /// dropped from storage; the token is restored independently.
    pub fn init(storage: Box<dyn LocalStorage>) -> SessionStore {
        let user = match storage.get(USER_KEY) {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    error!("Error parsing user from storage: {}", e);
                    if let Err(e) = storage.remove(USER_KEY) {
                        error!("Failed to remove invalid user entry: {}", e);
                    }
                    None
                }
            },
            None => None,
        };
        let access_token = storage.get(ACCESS_TOKEN_KEY);

        debug!("Session restored: user={}, token={}", user.is_some(), access_token.is_some());

        SessionStore {
            user,
            access_token,
            storage,
        }
    }

    /// Persists both entries before the in-memory session changes. If the token cannot be
    /// written, the stored user entry is put back the way it was and the session is untouched.
    pub fn set(&mut self, user: User, access_token: String) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(&user).map_err(ClientError::StorageFormat)?;
        let previous_user = self.storage.get(USER_KEY);

        self.storage.set(USER_KEY, &user_json)?;
        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, &access_token) {
            let restored = match &previous_user {
                Some(raw) => self.storage.set(USER_KEY, raw),
                None => self.storage.remove(USER_KEY),
            };
            if let Err(restore_err) = restored {
                error!("Failed to restore user entry: {}", restore_err);
            }
            return Err(e);
        }

        self.user = Some(user);
        self.access_token = Some(access_token);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.user = None;
        self.access_token = None;

        self.storage.remove(USER_KEY)?;
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        Ok(())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}
