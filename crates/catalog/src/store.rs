use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::book::Book;
use crate::error::StoreError;

/// Durable record store for the catalog.
///
/// The catalog rewrites the full collection after every mutation; there is
/// no diffing and no transaction log, so implementations only need a whole-
/// collection `load` and `save`.
pub trait BookStore: Send + Sync {
    fn load(&self) -> Result<Vec<Book>, StoreError>;
    fn save(&self, books: &[Book]) -> Result<(), StoreError>;
}

/// File-backed store: one pretty-printed JSON array of book records.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl BookStore for JsonFileStore {
    /// A missing file loads as an empty collection. An unreadable or corrupt
    /// file also loads as empty, with a warning: load failures are
    /// recoverable, save failures are not.
    fn load(&self) -> Result<Vec<Book>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(books) => Ok(books),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %err,
                    "catalog store is unreadable, starting with an empty collection"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, books: &[Book]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(books)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral catalogs.
#[derive(Default)]
pub struct MemoryStore {
    books: Mutex<Vec<Book>>,
}

impl BookStore for MemoryStore {
    fn load(&self) -> Result<Vec<Book>, StoreError> {
        let books = self.books.lock().unwrap_or_else(|err| err.into_inner());
        Ok(books.clone())
    }

    fn save(&self, books: &[Book]) -> Result<(), StoreError> {
        let mut slot = self.books.lock().unwrap_or_else(|err| err.into_inner());
        *slot = books.to_vec();
        Ok(())
    }
}
