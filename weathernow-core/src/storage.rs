//! Durable key-value storage used by the search history.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage file is corrupt: {0}")]
    Corrupt(String),
}

/// String-keyed, string-valued store. Writes are synchronous.
pub trait KeyValueStore: Send + std::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Non-persistent store; also the fallback when the file store fails.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All keys live in a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(unavailable(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    /// Write to a sibling temp file, then rename over the target so a crash
    /// never leaves a half-written file behind.
    fn replace_contents(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| unavailable(dir, e))?;
        tmp.write_all(bytes).map_err(|e| unavailable(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| unavailable(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| unavailable(&self.path, e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking every write.
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(msg)) => {
                tracing::warn!("overwriting corrupt storage file: {msg}");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| unavailable(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.replace_contents(json.as_bytes())
    }
}

fn unavailable(path: &Path, err: io::Error) -> StorageError {
    StorageError::Unavailable(format!("{}: {err}", path.display()))
}
