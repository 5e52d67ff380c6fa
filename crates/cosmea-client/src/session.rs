//! Session preferences: which account the client is signed in as.
//!
//! Stored as a small JSON file whose keys are `currentUserId` and
//! `currentUserName`.  Signing out clears both.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cosmea_shared::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Preferences {
    current_user_id: Option<UserId>,
    current_user_name: Option<String>,
    signed_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct Session {
    prefs: Preferences,
    path: Option<PathBuf>,
}

impl Session {
    /// A session that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the session stored at `path`; a missing file is a signed-out session.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let prefs = match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            prefs,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn current_user_id(&self) -> Option<&UserId> {
        self.prefs.current_user_id.as_ref()
    }

    pub fn current_user_name(&self) -> Option<&str> {
        self.prefs.current_user_name.as_deref()
    }

    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.prefs.signed_in_at
    }

    pub fn is_signed_in(&self) -> bool {
        self.prefs.current_user_id.is_some()
    }

    pub fn sign_in(&mut self, id: UserId, username: impl Into<String>) -> Result<(), SessionError> {
        let prefs = Preferences {
            current_user_id: Some(id),
            current_user_name: Some(username.into()),
            signed_in_at: Some(Utc::now()),
        };
        self.persist(&prefs)?;
        self.prefs = prefs;

        info!(user_id = ?self.prefs.current_user_id, "Signed in");
        Ok(())
    }

    pub fn sign_out(&mut self) -> Result<(), SessionError> {
        let prefs = Preferences::default();
        self.persist(&prefs)?;
        self.prefs = prefs;

        info!("Signed out");
        Ok(())
    }

    /// Write `prefs` to disk.  The in-memory state only changes once this
    /// has succeeded.
    fn persist(&self, prefs: &Preferences) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(prefs)?)?;
        Ok(())
    }
}
