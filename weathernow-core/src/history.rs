use crate::storage::{KeyValueStore, MemoryStore, StorageError};

/// Storage key holding the serialized history list.
pub const HISTORY_KEY: &str = "cityHistory";
pub const MAX_ENTRIES: usize = 10;

/// Most-recent-first list of distinct city queries, backed by a key-value store.
///
/// When the backing store fails, the history switches to an in-memory store
/// seeded with the last known entries and stays there for the rest of the process.
#[derive(Debug)]
pub struct SearchHistory {
    store: Box<dyn KeyValueStore>,
    persistent: bool,
    last_known: Vec<String>,
}

impl SearchHistory {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            persistent: true,
            last_known: Vec::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            persistent: false,
            last_known: Vec::new(),
        }
    }

    /// `false` once the durable store has failed and history is memory-only.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Current contents, most recent first.
    pub fn list(&mut self) -> Vec<String> {
        match self.read() {
            Ok(entries) => {
                self.last_known = entries.clone();
                entries
            }
            Err(e) => {
                self.degrade(&e);
                self.last_known.clone()
            }
        }
    }

    /// Move `city` to the front, dropping older entries beyond the bound, and persist.
    pub fn record(&mut self, city: &str) {
        let mut entries = self.list();
        push_front_distinct(&mut entries, city, MAX_ENTRIES);
        self.last_known = entries.clone();

        // `degrade` seeds the memory store with `last_known`, so nothing is lost.
        if let Err(e) = self.write(&entries) {
            self.degrade(&e);
        }
    }

    fn read(&self) -> Result<Vec<String>, StorageError> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            // Still writable; the next `record` replaces the bad contents.
            Err(StorageError::Corrupt(msg)) => {
                tracing::warn!("ignoring corrupt search history storage: {msg}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!("ignoring unreadable search history: {e}");
                Ok(Vec::new())
            }
        }
    }

    fn write(&mut self, entries: &[String]) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(entries).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.store.set(HISTORY_KEY, &raw)
    }

    fn degrade(&mut self, err: &StorageError) {
        if !self.persistent {
            return;
        }
        tracing::warn!("search history is no longer persistent: {err}");

        let mut memory = MemoryStore::new();
        if let Ok(raw) = serde_json::to_string(&self.last_known) {
            let _ = memory.set(HISTORY_KEY, &raw);
        }
        self.store = Box::new(memory);
        self.persistent = false;
    }
}

/// Insert `item` at the front, removing an existing exact match and truncating to `max`.
pub fn push_front_distinct(entries: &mut Vec<String>, item: &str, max: usize) {
    entries.retain(|e| e != item);
    entries.insert(0, item.to_string());
    entries.truncate(max);
}
