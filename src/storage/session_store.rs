use tracing::{info, warn};

use crate::models::Session;
use crate::storage::{LocalStorage, StorageError};

const SESSION_KEY: &str = "collab_auth_v1";

/// Persists the signed-in identity between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: LocalStorage,
}

impl SessionStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Persist a session, or its explicit absence
    pub fn save(&self, session: Option<&Session>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&session)?;
        self.storage.set_item(SESSION_KEY, &raw)
    }

    /// Previously saved session. Anything malformed or incomplete is treated as absent.
    pub fn load(&self) -> Option<Session> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        match serde_json::from_str::<Option<Session>>(&raw) {
            Ok(Some(session)) if session.is_complete() => Some(session),
            Ok(Some(_)) => {
                warn!("Stored session is incomplete, ignoring it");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Stored session is malformed, ignoring it: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        info!("Clearing stored session");
        self.storage.remove_item(SESSION_KEY)
    }
}
