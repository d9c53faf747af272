//! Durable last-seen reference.
//!
//! The state file is a single JSON object. Missing or unreadable state is
//! "no prior state": [`StateStore::load`] never fails. Writes go through a
//! temp file in the same directory and an atomic rename, so a crash mid-write
//! leaves the previous record intact.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StateError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchState {
    #[serde(default, alias = "last_url", alias = "last_repost_url")]
    pub last_seen_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WatchState {
    #[must_use]
    pub fn with_reference(reference: &str) -> Self {
        Self {
            last_seen_reference: Some(reference.to_owned()),
            updated_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state file, treating every failure as empty state.
    #[must_use]
    pub fn load(&self) -> WatchState {
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable state; starting without a baseline");
                WatchState::default()
            }
        }
    }

    /// Reads the state file. A missing file is empty state; a blank stored
    /// reference is treated as absent.
    ///
    /// # Errors
    ///
    /// - [`StateError::Io`] if the file exists but cannot be read.
    /// - [`StateError::Corrupt`] if the content is not a state record.
    pub fn try_load(&self) -> Result<WatchState, StateError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file yet");
                return Ok(WatchState::default());
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut state: WatchState =
            serde_json::from_str(&text).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        state.last_seen_reference = state
            .last_seen_reference
            .filter(|r| !r.trim().is_empty());
        Ok(state)
    }

    /// Atomically replaces the state file with `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the directory, temp file or rename fails.
    pub fn save(&self, state: &WatchState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| self.io_error(source))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| self.io_error(source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.write_all(b"\n"))
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| self.io_error(source))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    /// Deletes the state file. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the file exists but cannot be removed.
    pub fn reset(&self) -> Result<bool, StateError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
