//! Render cache for plantgen.
//!
//! Rendering goes through a remote service, so each diagram is only rendered
//! again when its text changed or its output file disappeared. The cache maps
//! a logical diagram key to the fingerprint of the text last rendered for it
//! and the file it was written to.
//!
//! - [`CacheStore`]: Load/save capability for the persisted map
//! - [`RenderCache`]: Render decisions over a loaded map, with a [`FlushPolicy`]
//!
//! # Implementations
//!
//! - [`JsonFileStore`]: Flat JSON object on disk, replaced atomically on save
//! - [`MemoryStore`]: In-memory map for tests and dry runs
//! - [`NullStore`]: Loads nothing, saves nothing (caching disabled)
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use plantgen_cache::{fingerprint, FlushPolicy, MemoryStore, RenderCache};
//!
//! let cache = RenderCache::load(Box::new(MemoryStore::default()), FlushPolicy::AtEnd);
//! let fp = fingerprint("@startuml\nA -> B\n@enduml");
//! assert!(cache.should_render("shared_Foo", &fp, Path::new("aux_Foo.svg")));
//! ```

mod render;
mod store;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use render::{FlushPolicy, RenderCache};
pub use store::{CacheStore, JsonFileStore, MemoryStore, NullStore};

/// Persisted state of one diagram key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Fingerprint of the unthemed diagram text.
    ///
    /// Cache files from earlier generator versions name this field `hash`
    /// and hold MD5 digests. They load without error, but an MD5 digest never
    /// equals a SHA-256 fingerprint, so each of those entries renders once
    /// more and is then rewritten in the current form.
    #[serde(alias = "hash")]
    pub fingerprint: String,
    /// Where the rendered output was written.
    pub path: PathBuf,
}

/// Key to entry map. Ordered so that saved files diff cleanly.
pub type CacheMap = BTreeMap<String, CacheEntry>;

/// Errors persisting the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Content fingerprint of a diagram text (SHA-256, lowercase hex).
#[must_use]
pub fn fingerprint(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}
