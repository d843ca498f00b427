use crate::api::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage for the last session id issued by an inverter. Implementations never fail:
/// problems are logged and `get` reports no session.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn save(&self, sid: &str);
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    sid: String,
}

/// Session id kept in a small JSON file: `{"sid": "..."}`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, Error> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            Error::SessionStore(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str::<StoredSession>(&contents)
            .map(|stored| stored.sid)
            .map_err(|e| {
                Error::SessionStore(format!("failed to parse {}: {}", self.path.display(), e))
            })
    }

    fn write(&self, sid: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::SessionStore(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let json = serde_json::to_string(&StoredSession {
            sid: sid.to_string(),
        })
        .map_err(|e| Error::SessionStore(format!("failed to serialize session: {}", e)))?;

        /* temp file + rename: a crash never leaves a truncated record */
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(|e| {
            Error::SessionStore(format!("failed to write {}: {}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::SessionStore(format!("failed to rename to {}: {}", self.path.display(), e))
        })
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        if !self.path.exists() {
            log::debug!("No stored session id at {}", self.path.display());
            return None;
        }

        match self.read() {
            Ok(sid) => {
                log::info!("Retrieving previously stored session id");
                Some(sid)
            }
            Err(e) => {
                log::warn!("Ignoring stored session id: {}", e);
                None
            }
        }
    }

    fn save(&self, sid: &str) {
        match self.write(sid) {
            Ok(()) => log::info!("Persisted new session id to {}", self.path.display()),
            Err(e) => log::error!("Could not persist session id: {}", e),
        }
    }
}
