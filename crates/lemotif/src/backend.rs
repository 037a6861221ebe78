// Pattern Backends
//
// *Le Support* (The Medium) - Opaque durable storage for the exemplar blob

use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Default file name for persisted exemplars
pub const DEFAULT_PATTERNS_FILE: &str = "patterns.json";

/// Durable storage for the serialized exemplar list
///
/// The store hands backends an opaque blob; backends never interpret it.
pub trait PatternBackend: Send + Sync {
    /// Load the last persisted blob, `Ok(None)` when nothing was ever written
    fn load_blob(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the persisted blob
    fn persist_blob(&self, blob: &[u8]) -> Result<()>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

/// File-backed storage with write-to-temp-then-rename replacement
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend writing to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_PATTERNS_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PatternBackend for FileBackend {
    fn load_blob(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn persist_blob(&self, blob: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory storage, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a blob
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: Mutex::new(Some(blob)),
        }
    }

    /// Copy of the current blob
    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PatternBackend for MemoryBackend {
    fn load_blob(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob())
    }

    fn persist_blob(&self, blob: &[u8]) -> Result<()> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(blob.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
