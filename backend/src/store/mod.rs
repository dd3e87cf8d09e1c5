//! Persistence for the single JSON document.
//!
//! A [`Store`] only knows how to load and save the whole document.
//! [`Database`] layers the read-modify-write cycle on top and serializes
//! writers inside this process. Two processes sharing one file are still
//! last-write-wins.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::sync::Mutex;

use watchearn_common::Document;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed document: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize document: {0}")]
    Serialize(serde_json::Error),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Backing storage for the document.
pub trait Store: Send + Sync {
    /// Current document, or an empty one if nothing has been saved yet.
    fn load(&self) -> Result<Document, StoreError>;

    fn save(&self, doc: &Document) -> Result<(), StoreError>;
}

/// Document access for request handlers.
pub struct Database {
    store: Box<dyn Store>,
    write_lock: Mutex<()>,
}

impl Database {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot for read-only requests.
    pub fn read(&self) -> Result<Document, StoreError> {
        self.store.load()
    }

    /// Load, apply `f`, and save. Nothing is written when `f` fails.
    pub fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Document) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut doc = self.store.load()?;
        let value = f(&mut doc)?;
        self.store.save(&doc)?;
        Ok(value)
    }
}
