//! Durable storage for the single bearer-token slot.
//!
//! Absence of a token means "not logged in"; presence triggers silent
//! re-validation on startup.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use parking_lot::Mutex;

pub trait TokenStore: Send + Sync {
    fn load(&self) -> CamwatchResult<Option<String>>;
    fn save(&self, token: &str) -> CamwatchResult<()>;
    /// Clearing an empty slot is not an error.
    fn clear(&self) -> CamwatchResult<()>;
}

/// Token slot kept in a file, readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub const FILE_NAME: &'static str = "access_token";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/camwatch/access_token`.
    pub fn default_location() -> CamwatchResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| CamwatchError::Storage("no data directory on this platform".into()))?;
        Ok(Self::new(dir.join("camwatch").join(Self::FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> CamwatchError {
    CamwatchError::Storage(format!("{action} {}: {err}", path.display()))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> CamwatchResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("reading", &self.path, e)),
        }
    }

    fn save(&self, token: &str) -> CamwatchResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error("creating", parent, e))?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .map_err(|e| storage_error("opening", &self.path, e))?;
        file.write_all(token.as_bytes())
            .map_err(|e| storage_error("writing", &self.path, e))
    }

    fn clear(&self) -> CamwatchResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("removing", &self.path, e)),
        }
    }
}

/// In-memory slot; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    pub fn peek(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> CamwatchResult<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, token: &str) -> CamwatchResult<()> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> CamwatchResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileTokenStore {
        let dir = std::env::temp_dir().join(format!("camwatch-{name}-{}", std::process::id()));
        FileTokenStore::new(dir.join(FileTokenStore::FILE_NAME))
    }

    #[test]
    fn file_slot_lifecycle() {
        let store = temp_store("lifecycle");
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

        store.save("second").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let store = temp_store("mode");
        store.save("secret").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        store.clear().unwrap();
    }

    #[test]
    fn memory_clones_share_slot() {
        let store = MemoryTokenStore::new();
        let other = store.clone();
        store.save("t").unwrap();
        assert_eq!(other.peek().as_deref(), Some("t"));
    }
}
