use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use watchearn_common::Document;

use super::{Store, StoreError};

/// Document stored as pretty-printed JSON on disk.
///
/// Saves go through a temp file in the same directory and a rename, so
/// readers never observe a half-written document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<Document, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No document at {}, starting empty", self.path.display());
                return Ok(Document::default());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Document::default());
        }

        serde_json::from_str(&contents).map_err(StoreError::Parse)
    }

    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let dir = self.dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, doc).map_err(StoreError::Serialize)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(
            users = doc.users.len(),
            approvals = doc.approvals.len(),
            "Saved document to {}",
            self.path.display()
        );
        Ok(())
    }
}
