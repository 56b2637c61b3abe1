// Schema resource management and loading
//
// The store plays both external roles from the serialization library's
// side of the boundary: the resource manager (URI to document text) and
// the schema loader (URI to parsed document). Document text is registered
// in memory; this core performs no file or network I/O. Each URI is parsed
// at most once and the parse is shared process-wide.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value as JsonValue;

use crate::internal::error::{Error, Result};
use crate::schema::document::SchemaDocument;

static GLOBAL_STORE: OnceLock<SchemaStore> = OnceLock::new();

/// In-memory registry of schema document text with a parse-once cache.
#[derive(Debug, Default)]
pub struct SchemaStore {
    /// URI to registered document text.
    sources: RwLock<HashMap<String, String>>,
    /// URI to parsed document, one parse per URI.
    cache: RwLock<HashMap<String, Arc<SchemaDocument>>>,
}

impl SchemaStore {
    /// Creates an empty store. Most callers want [`SchemaStore::global`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store consulted by node schema resolution.
    pub fn global() -> &'static SchemaStore {
        GLOBAL_STORE.get_or_init(SchemaStore::new)
    }

    /// Registers document text under a URI.
    pub fn add_source(&self, uri: &str, text: &str) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.to_string(), text.to_string());
    }

    /// Resolves a URI to its registered document text.
    pub fn resolve(&self, uri: &str) -> Result<String> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::ResourceError(format!("no document registered for '{}'", uri)))
    }

    /// Loads the parsed document for a URI, parsing and caching on first
    /// use.
    pub fn load(&self, uri: &str) -> Result<Arc<SchemaDocument>> {
        self.load_guarded(uri, &mut HashSet::new())
    }

    /// Returns true if a document is registered for the URI.
    pub fn has_source(&self, uri: &str) -> bool {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(uri)
    }

    pub(crate) fn load_guarded(
        &self,
        uri: &str,
        seen: &mut HashSet<String>,
    ) -> Result<Arc<SchemaDocument>> {
        if let Some(doc) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
        {
            return Ok(Arc::clone(doc));
        }

        if !seen.insert(uri.to_string()) {
            return Err(Error::SchemaError(format!(
                "circular $ref chain through '{}'",
                uri
            )));
        }

        let text = self.resolve(uri)?;
        let json: JsonValue = serde_json::from_str(&text)
            .map_err(|e| Error::SchemaError(format!("'{}' is not valid JSON: {}", uri, e)))?;
        let doc = Arc::new(SchemaDocument::parse(uri, &json, self, seen)?);

        // Double-checked insert: a concurrent first parse wins.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(uri.to_string()).or_insert(doc)))
    }
}
