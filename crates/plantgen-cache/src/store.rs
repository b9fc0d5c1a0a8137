//! Persistence of the cache map.
//!
//! Loading never fails: a missing file is a cold cache and a corrupt one is
//! logged and discarded. Saving rewrites the whole map.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;

use crate::{CacheError, CacheMap};

/// Load/save capability for the persisted cache map.
pub trait CacheStore: Send + Sync {
    /// Load the persisted map, or an empty one if there is none.
    fn load(&self) -> CacheMap;

    /// Replace the persisted map with `map`.
    fn save(&self, map: &CacheMap) -> Result<(), CacheError>;
}

/// [`CacheStore`] backed by a JSON file.
///
/// The file is a flat object mapping cache key to `{fingerprint, path}`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CacheStore for JsonFileStore {
    fn load(&self) -> CacheMap {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no cache file, starting empty");
                return CacheMap::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read cache, starting empty: {e}");
                return CacheMap::new();
            }
        };

        match serde_json::from_str(&data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "corrupt cache file, starting empty: {e}");
                CacheMap::new()
            }
        }
    }

    fn save(&self, map: &CacheMap) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Written next to the target so the rename stays on one filesystem.
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, map)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-memory [`CacheStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<CacheMap>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    /// Copy of the last saved map.
    #[must_use]
    pub fn snapshot(&self) -> CacheMap {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times [`CacheStore::save`] was called.
    #[must_use]
    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> CacheMap {
        self.snapshot()
    }

    fn save(&self, map: &CacheMap) -> Result<(), CacheError> {
        *self.map.lock().unwrap_or_else(PoisonError::into_inner) = map.clone();
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn load(&self) -> CacheMap {
        self.as_ref().load()
    }

    fn save(&self, map: &CacheMap) -> Result<(), CacheError> {
        self.as_ref().save(map)
    }
}

/// [`CacheStore`] that never persists anything.
///
/// Used when caching is disabled: every run starts cold.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl CacheStore for NullStore {
    fn load(&self) -> CacheMap {
        CacheMap::new()
    }

    fn save(&self, _map: &CacheMap) -> Result<(), CacheError> {
        Ok(())
    }
}
