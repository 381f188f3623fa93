// Process-local cache of the cleaned table for the current upload.
// One browser session owns one store; a new upload replaces the cached
// table, so re-renders with unchanged filters skip the parse/normalize/
// reshape work.
use sha2::{Digest, Sha256};
use shared::models::{CanonicalRecord, TidyRow};
use std::collections::HashMap;

/// The fully cleaned form of one uploaded file: canonical records plus
/// their unpivoted tidy rows.
#[derive(Debug, Clone)]
pub struct CleanTable {
    pub records: Vec<CanonicalRecord>,
    pub rows: Vec<TidyRow>,
}

pub struct SessionStore {
    tables: HashMap<String, CleanTable>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            tables: HashMap::new(),
        }
    }

    /// Cache key for an upload: hex SHA-256 of the raw bytes.
    pub fn content_key(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    pub fn get(&self, key: &str) -> Option<&CleanTable> {
        self.tables.get(key)
    }

    /// Stores the cleaned table for a new upload, evicting any previous
    /// one — the session only ever works on the latest file.
    pub fn insert(&mut self, key: String, table: CleanTable) {
        self.tables.clear();
        self.tables.insert(key, table);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
