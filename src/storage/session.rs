use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{read_json, write_json_atomic};
use crate::errors::StorageError;

pub const SESSION_FILE: &str = "session.json";

/// What `login` leaves behind for later commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: u64,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SESSION_FILE),
        }
    }

    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(read_json::<Session>(&self.path)?.filter(|s| !s.token.trim().is_empty()))
    }

    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        write_json_atomic(&self.path, session)
    }

    /// Remove the stored session. Returns whether there was one.
    pub fn clear(&self) -> Result<bool, StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }
}
