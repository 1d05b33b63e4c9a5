use std::sync::{Mutex, PoisonError};

use ahash::HashMap;
use polygraph::CatalogHandle;
use tracing::trace;

use crate::{Document, decode, errors::Result};

/// Remembers decoded documents by their notation text
///
/// Every caller gets its own deep copy of the cached [`Document`], and overlapping calls are serialized. Entries are
/// tagged with the version of the catalog they were decoded against, and are decoded again once that catalog has been
/// replaced.
#[derive(Debug, Default)]
pub struct NotationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    version: u64,
    document: Document,
}

impl NotationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_notation(&self, notation: &str, catalog: &CatalogHandle) -> Result<Document> {
        let snapshot = catalog.snapshot();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(notation) {
            if entry.version == snapshot.version() {
                trace!(notation, "notation cache hit");
                return Ok(entry.document.clone());
            }
        }

        trace!(notation, version = snapshot.version(), "notation cache miss");
        let document = decode(notation, &snapshot)?;
        let entry = CacheEntry {
            version: snapshot.version(),
            document: document.clone(),
        };
        entries.insert(notation.to_owned(), entry);
        Ok(document)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
