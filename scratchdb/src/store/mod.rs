use crate::document::Document;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Owns the backing JSON file. Every read and write covers the whole
/// document: there are no partial writes, transactions, or locks at
/// this layer. The engine serializes load-mutate-save cycles.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Point the store at a backing file. The file itself is created
    /// lazily on the first `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the backing file. An absent file is not an
    /// error: an empty document is written out and returned, so the
    /// first request against a fresh path bootstraps the datastore.
    /// Unreadable or unparseable contents are surfaced as-is.
    pub fn load(&self) -> Result<Document> {
        if !self.path.exists() {
            log::info!(
                "Database file {} does not exist, creating it",
                self.path.display()
            );
            let doc = Document::new();
            self.save(&doc)?;
            return Ok(doc);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let doc: Document = serde_json::from_str(&raw)?;
        Ok(doc)
    }

    /// Serialize the whole document pretty-printed and replace the
    /// file contents. Write-through: callers persist after every
    /// mutation, keeping disk and memory consistent.
    pub fn save(&self, doc: &Document) -> Result<()> {
        let pretty = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, pretty)?;
        Ok(())
    }
}
