//! Session persistence for long-running enumerations.
//!
//! A session file begins with the (version, rule name, uuid) triple of
//! the ruleset it was saved against; loading verifies all three before
//! touching the state, so a session can never silently resume against a
//! re-trained or different ruleset. Saves go through a temp file and an
//! atomic rename, surviving a crash mid-save with the previous save
//! intact.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enumerator::EnumeratorState;
use crate::error::SessionError;

/// File extension for saved sessions.
const SESSION_SUFFIX: &str = "sav";

#[derive(Serialize, Deserialize)]
struct SessionFile {
    version: String,
    rule_name: String,
    uuid: String,
    state: EnumeratorState,
}

/// Saves and restores enumerator state for one (ruleset, session) pair.
pub struct SessionStore {
    path: PathBuf,
    version: String,
    rule_name: String,
    uuid: String,
}

impl SessionStore {
    pub fn new(
        base_dir: &Path,
        session_name: &str,
        version: impl Into<String>,
        rule_name: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            path: base_dir.join(format!("{session_name}.{SESSION_SUFFIX}")),
            version: version.into(),
            rule_name: rule_name.into(),
            uuid: uuid.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the state atomically (temp file, then rename).
    pub fn save(&self, state: &EnumeratorState) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let payload = SessionFile {
            version: self.version.clone(),
            rule_name: self.rule_name.clone(),
            uuid: self.uuid.clone(),
            state: state.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&payload).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(SESSION_SUFFIX);
        let tmp_path = self
            .path
            .with_file_name(format!("{file_name}.tmp.{}", std::process::id()));
        fs::write(&tmp_path, &bytes).map_err(|source| SessionError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the state back, rejecting saves from a different ruleset,
    /// rule name, or trainer version.
    pub fn load(&self) -> Result<EnumeratorState, SessionError> {
        let bytes = fs::read(&self.path).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;
        let payload: SessionFile =
            serde_json::from_slice(&bytes).map_err(|source| SessionError::Json {
                path: self.path.clone(),
                source,
            })?;
        if payload.version != self.version {
            return Err(SessionError::VersionMismatch {
                found: payload.version,
                expected: self.version.clone(),
            });
        }
        if payload.rule_name != self.rule_name {
            return Err(SessionError::RuleMismatch {
                found: payload.rule_name,
                expected: self.rule_name.clone(),
            });
        }
        if payload.uuid != self.uuid {
            return Err(SessionError::UuidMismatch {
                found: payload.uuid,
                expected: self.uuid.clone(),
            });
        }
        Ok(payload.state)
    }
}
