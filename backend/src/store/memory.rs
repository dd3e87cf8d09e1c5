use std::sync::Mutex;

use watchearn_common::Document;

use super::{Store, StoreError};

/// Store that keeps the document in process memory. Used by tests.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Document, StoreError> {
        let doc = self.doc.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(doc.clone())
    }

    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let mut current = self.doc.lock().map_err(|_| StoreError::Poisoned)?;
        *current = doc.clone();
        Ok(())
    }
}
