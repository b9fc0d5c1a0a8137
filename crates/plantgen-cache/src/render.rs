//! Render decisions over a loaded cache map.

use std::path::Path;

use crate::{CacheEntry, CacheError, CacheMap, CacheStore};

/// When recorded renders are written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Save after every recorded render. A crash loses at most the render in
    /// flight.
    #[default]
    EachRender,
    /// Save once, on [`RenderCache::flush`].
    AtEnd,
}

/// Cache map loaded at start, consulted before and updated after each render.
pub struct RenderCache {
    store: Box<dyn CacheStore>,
    policy: FlushPolicy,
    entries: CacheMap,
    dirty: bool,
}

impl RenderCache {
    /// Load the map from `store`.
    #[must_use]
    pub fn load(store: Box<dyn CacheStore>, policy: FlushPolicy) -> Self {
        let entries = store.load();
        tracing::debug!(entries = entries.len(), "render cache loaded");
        Self {
            store,
            policy,
            entries,
            dirty: false,
        }
    }

    /// Whether the diagram under `key` has to be rendered.
    ///
    /// Rendering is skipped only when an entry exists for `key`, its
    /// fingerprint equals `fingerprint` and `output` still exists on disk.
    #[must_use]
    pub fn should_render(&self, key: &str, fingerprint: &str, output: &Path) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.fingerprint == fingerprint => !output.exists(),
            _ => true,
        }
    }

    /// Record a successful render of `key` to `output`.
    ///
    /// With [`FlushPolicy::EachRender`] the map is saved right away; a failed
    /// save is logged and retried on the next flush.
    pub fn record(&mut self, key: &str, fingerprint: &str, output: &Path) {
        self.entries.insert(
            key.to_owned(),
            CacheEntry {
                fingerprint: fingerprint.to_owned(),
                path: output.to_path_buf(),
            },
        );
        self.dirty = true;

        if self.policy == FlushPolicy::EachRender
            && let Err(e) = self.flush()
        {
            tracing::warn!("failed to save render cache: {e}");
        }
    }

    /// Save the map if anything was recorded since the last save.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        self.store.save(&self.entries)?;
        self.dirty = false;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::{JsonFileStore, MemoryStore, fingerprint};
    use tempfile::TempDir;

    const SOURCE: &str = "@startuml\nclass Tier\n@enduml";

    #[test]
    fn test_unknown_key_renders() {
        let cache = RenderCache::load(Box::new(MemoryStore::default()), FlushPolicy::AtEnd);
        assert!(cache.should_render("lvl_1_main", &fingerprint(SOURCE), Path::new("x.svg")));
    }

    #[test]
    fn test_unchanged_text_with_existing_output_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("lvl1.svg");
        fs::write(&output, "<svg/>").unwrap();

        let mut cache = RenderCache::load(Box::new(MemoryStore::default()), FlushPolicy::AtEnd);
        let fp = fingerprint(SOURCE);
        cache.record("lvl_1_main", &fp, &output);

        assert!(!cache.should_render("lvl_1_main", &fp, &output));
    }

    #[test]
    fn test_changed_text_renders_again() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("lvl1.svg");
        fs::write(&output, "<svg/>").unwrap();

        let mut cache = RenderCache::load(Box::new(MemoryStore::default()), FlushPolicy::AtEnd);
        cache.record("lvl_1_main", &fingerprint(SOURCE), &output);

        let edited = SOURCE.replace("Tier", "Tiere");
        assert!(cache.should_render("lvl_1_main", &fingerprint(&edited), &output));
    }

    #[test]
    fn test_deleted_output_renders_again() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("lvl1.svg");
        fs::write(&output, "<svg/>").unwrap();

        let mut cache = RenderCache::load(Box::new(MemoryStore::default()), FlushPolicy::AtEnd);
        let fp = fingerprint(SOURCE);
        cache.record("lvl_1_main", &fp, &output);
        fs::remove_file(&output).unwrap();

        assert!(cache.should_render("lvl_1_main", &fp, &output));
    }

    #[test]
    fn test_each_render_policy_saves_every_record() {
        let store = Arc::new(MemoryStore::default());
        let mut cache = RenderCache::load(Box::new(Arc::clone(&store)), FlushPolicy::EachRender);

        cache.record("a", "1", Path::new("a.svg"));
        cache.record("b", "2", Path::new("b.svg"));

        assert_eq!(store.saves(), 2);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_at_end_policy_saves_once_on_flush() {
        let store = Arc::new(MemoryStore::default());
        let mut cache = RenderCache::load(Box::new(Arc::clone(&store)), FlushPolicy::AtEnd);

        cache.record("a", "1", Path::new("a.svg"));
        cache.record("b", "2", Path::new("b.svg"));
        assert_eq!(store.saves(), 0);

        cache.flush().unwrap();
        cache.flush().unwrap();
        assert_eq!(store.saves(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_flush_without_records_does_not_save() {
        let store = Arc::new(MemoryStore::default());
        let mut cache = RenderCache::load(Box::new(Arc::clone(&store)), FlushPolicy::AtEnd);
        cache.flush().unwrap();
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn test_decisions_survive_a_restart() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("plantuml_cache.json");
        let output = tmp.path().join("aux_Foo.svg");
        fs::write(&output, "<svg/>").unwrap();
        let fp = fingerprint(SOURCE);

        let mut first = RenderCache::load(
            Box::new(JsonFileStore::new(cache_path.clone())),
            FlushPolicy::EachRender,
        );
        first.record("shared_Foo", &fp, &output);

        let second = RenderCache::load(
            Box::new(JsonFileStore::new(cache_path)),
            FlushPolicy::EachRender,
        );
        assert_eq!(second.len(), 1);
        assert!(!second.should_render("shared_Foo", &fp, &output));
    }

    #[test]
    fn test_legacy_md5_entry_renders_once_more() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("plantuml_cache.json");
        let output = tmp.path().join("lvl1.svg");
        fs::write(&output, "<svg/>").unwrap();
        fs::write(
            &cache_path,
            format!(
                r#"{{"lvl_1_main": {{"hash": "d41d8cd98f00b204e9800998ecf8427e", "path": "{}"}}}}"#,
                output.display()
            ),
        )
        .unwrap();
        let fp = fingerprint(SOURCE);

        let mut cache = RenderCache::load(
            Box::new(JsonFileStore::new(cache_path.clone())),
            FlushPolicy::EachRender,
        );
        assert_eq!(cache.len(), 1);
        assert!(cache.should_render("lvl_1_main", &fp, &output));

        cache.record("lvl_1_main", &fp, &output);
        let reloaded = RenderCache::load(Box::new(JsonFileStore::new(cache_path)), FlushPolicy::EachRender);
        assert!(!reloaded.should_render("lvl_1_main", &fp, &output));
    }

    #[test]
    fn test_record_overwrites_entry() {
        let mut cache = RenderCache::load(Box::new(MemoryStore::default()), FlushPolicy::AtEnd);
        cache.record("k", "1", Path::new("old.svg"));
        cache.record("k", "2", Path::new("new.svg"));

        let entry = cache.get("k").unwrap();
        assert_eq!(entry.fingerprint, "2");
        assert_eq!(entry.path, Path::new("new.svg"));
        assert_eq!(cache.len(), 1);
    }
}
