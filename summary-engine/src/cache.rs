//! Persistent summary cache with crash-safe promotion.
//!
//! The cache maps `entity_id` to the artifacts generated for that entity.
//! On disk it is a single JSON file under `<project>/.cache/` with two
//! rolling backups; a new generation is written to a temp file and only
//! promoted over the main file after a sanity check, so a run that loses
//! most of its entities (wrong database, empty scan) cannot destroy a good
//! cache. Alongside the persistent map, a per-run status map records which
//! entities were regenerated this run; dependents consult it to decide
//! staleness.
//!
//! Locking: the cache map and the status map sit behind separate mutexes,
//! taken only for map access and never across an await point. One process
//! owns the cache directory for the duration of a run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::SummaryError;

/// Artifacts cached per entity. Methods carry all three fields; other
/// kinds only a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_hash: Option<String>,
}

impl CacheEntry {
    /// Overlays `other`'s present fields onto `self`.
    fn merge(&mut self, other: CacheEntry) {
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        if other.code_analysis.is_some() {
            self.code_analysis = other.code_analysis;
        }
        if other.code_hash.is_some() {
            self.code_hash = other.code_hash;
        }
    }
}

/// Thresholds for the save-time sanity gate.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Promotion is refused when the new map is smaller than this fraction
    /// of the old one.
    pub sanity_ratio: f64,
    /// Old maps at or below this size are never protected.
    pub sanity_floor: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { sanity_ratio: 0.95, sanity_floor: 100 }
    }
}

/// On-disk summary cache plus the per-run change log.
pub struct SummaryCache {
    cache_file: PathBuf,
    tmp_file: PathBuf,
    bak1_file: PathBuf,
    bak2_file: PathBuf,
    options: CacheOptions,

    entries: Mutex<HashMap<String, CacheEntry>>,
    changed: Mutex<HashMap<String, bool>>,
}

impl SummaryCache {
    /// Creates the cache rooted at `<project_path>/.cache/`, creating the
    /// directory if needed. Nothing is read until [`Self::load`].
    pub fn new(project_path: &Path, options: CacheOptions) -> Result<Self, SummaryError> {
        let cache_dir = project_path.join(".cache");
        fs::create_dir_all(&cache_dir)?;
        info!(dir = %cache_dir.display(), "summary cache initialized");

        Ok(Self {
            cache_file: cache_dir.join("summary_cache.json"),
            tmp_file: cache_dir.join("summary_cache.json.tmp"),
            bak1_file: cache_dir.join("summary_cache.json.bak.1"),
            bak2_file: cache_dir.join("summary_cache.json.bak.2"),
            options,
            entries: Mutex::new(HashMap::new()),
            changed: Mutex::new(HashMap::new()),
        })
    }

    /// Loads the cache from disk. A missing file starts an empty cache; an
    /// unreadable or corrupt file is logged and also starts empty.
    pub fn load(&self) {
        let loaded = match fs::read_to_string(&self.cache_file) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(map) => {
                    info!(entries = map.len(), file = %self.cache_file.display(), "cache loaded");
                    map
                }
                Err(e) => {
                    error!(file = %self.cache_file.display(), error = %e,
                        "cache file corrupt; starting with an empty cache");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file = %self.cache_file.display(), "cache file not found; starting empty");
                HashMap::new()
            }
            Err(e) => {
                error!(file = %self.cache_file.display(), error = %e,
                    "cache file unreadable; starting with an empty cache");
                HashMap::new()
            }
        };
        *self.entries.lock().expect("cache lock poisoned") = loaded;
    }

    /// Saves the cache with the multi-stage promotion protocol: write to
    /// the temp file, sanity-check against the current main file, rotate
    /// backups, move into place.
    ///
    /// A failed sanity check leaves the main file untouched and keeps the
    /// temp file for inspection; it is not an `Err` because the run itself
    /// succeeded.
    pub fn save(&self) -> Result<(), SummaryError> {
        info!("starting cache save");
        let snapshot = self.entries.lock().expect("cache lock poisoned").clone();
        let serialized = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| SummaryError::CacheIo(std::io::Error::other(e)))?;
        fs::write(&self.tmp_file, serialized)?;

        if !self.promotion_is_sane(snapshot.len()) {
            return Ok(());
        }

        self.rotate_backups()?;
        fs::rename(&self.tmp_file, &self.cache_file)?;
        info!(entries = snapshot.len(), file = %self.cache_file.display(), "cache promoted");
        Ok(())
    }

    /// Refuses to overwrite a large cache with a much smaller one.
    fn promotion_is_sane(&self, new_len: usize) -> bool {
        let old_len = match fs::read_to_string(&self.cache_file) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(map) => map.len(),
                Err(e) => {
                    warn!(error = %e, "could not sanity-check old cache; promoting anyway");
                    return true;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return true,
            Err(e) => {
                warn!(error = %e, "could not sanity-check old cache; promoting anyway");
                return true;
            }
        };

        if old_len > self.options.sanity_floor
            && (new_len as f64) < (old_len as f64) * self.options.sanity_ratio
        {
            error!(
                old = old_len,
                new = new_len,
                tmp = %self.tmp_file.display(),
                "sanity check failed: new cache is significantly smaller than the old one; \
                 aborting promotion, temp file kept for inspection"
            );
            return false;
        }
        true
    }

    /// Two-level rolling backups: main → .bak.1 → .bak.2.
    fn rotate_backups(&self) -> Result<(), SummaryError> {
        if self.bak2_file.exists() {
            fs::remove_file(&self.bak2_file)?;
        }
        if self.bak1_file.exists() {
            fs::rename(&self.bak1_file, &self.bak2_file)?;
        }
        if self.cache_file.exists() {
            fs::rename(&self.cache_file, &self.bak1_file)?;
        }
        Ok(())
    }

    /* --------------------- In-memory API --------------------- */

    /// Cached artifacts for an entity, empty when unknown.
    pub fn entry(&self, entity_id: &str) -> CacheEntry {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(entity_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Overlays `update`'s present fields onto the entity's entry.
    pub fn update(&self, entity_id: &str, update: CacheEntry) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .entry(entity_id.to_string())
            .or_default()
            .merge(update);
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records that this entity's artifacts were regenerated this run.
    pub fn mark_regenerated(&self, entity_id: &str) {
        self.changed
            .lock()
            .expect("status lock poisoned")
            .insert(entity_id.to_string(), true);
    }

    /// True when any of the given entities was regenerated this run.
    /// Dependents use this to propagate invalidation bottom-up.
    pub fn was_dependency_changed<I, S>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let changed = self.changed.lock().expect("status lock poisoned");
        ids.into_iter()
            .any(|id| changed.get(id.as_ref()).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(summary: &str) -> CacheEntry {
        CacheEntry { summary: Some(summary.to_string()), ..Default::default() }
    }

    fn cache_with(dir: &TempDir) -> SummaryCache {
        SummaryCache::new(dir.path(), CacheOptions::default()).unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir);
        cache.update("id-1", entry("first"));
        cache.update(
            "id-2",
            CacheEntry {
                summary: Some("second".into()),
                code_analysis: Some("analysis".into()),
                code_hash: Some("abcd".into()),
            },
        );
        cache.save().unwrap();

        let reloaded = cache_with(&dir);
        reloaded.load();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.entry("id-1").summary.as_deref(), Some("first"));
        assert_eq!(reloaded.entry("id-2").code_hash.as_deref(), Some("abcd"));
    }

    #[test]
    fn backup_holds_previous_generation() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir);
        cache.update("id-1", entry("v1"));
        cache.save().unwrap();
        let first_generation = fs::read_to_string(dir.path().join(".cache/summary_cache.json")).unwrap();

        cache.update("id-2", entry("v2"));
        cache.save().unwrap();

        let bak1 = fs::read_to_string(dir.path().join(".cache/summary_cache.json.bak.1")).unwrap();
        assert_eq!(bak1, first_generation);
    }

    #[test]
    fn shrunken_cache_is_not_promoted() {
        let dir = TempDir::new().unwrap();
        {
            let big = cache_with(&dir);
            for i in 0..200 {
                big.update(&format!("id-{i}"), entry("x"));
            }
            big.save().unwrap();
        }

        let small = cache_with(&dir);
        small.load();
        assert_eq!(small.len(), 200);

        // Simulate a run that only discovered a tiny slice of the project.
        let shrunken = cache_with(&dir);
        shrunken.update("id-only", entry("y"));
        shrunken.save().unwrap();

        let main = fs::read_to_string(dir.path().join(".cache/summary_cache.json")).unwrap();
        let main_map: HashMap<String, CacheEntry> = serde_json::from_str(&main).unwrap();
        assert_eq!(main_map.len(), 200, "main file must stay untouched");
        assert!(dir.path().join(".cache/summary_cache.json.tmp").exists());
    }

    #[test]
    fn small_caches_are_not_protected() {
        let dir = TempDir::new().unwrap();
        {
            let cache = cache_with(&dir);
            for i in 0..10 {
                cache.update(&format!("id-{i}"), entry("x"));
            }
            cache.save().unwrap();
        }

        let next = cache_with(&dir);
        next.update("id-single", entry("y"));
        next.save().unwrap();

        let main = fs::read_to_string(dir.path().join(".cache/summary_cache.json")).unwrap();
        let main_map: HashMap<String, CacheEntry> = serde_json::from_str(&main).unwrap();
        assert_eq!(main_map.len(), 1);
    }

    #[test]
    fn dependency_change_tracking() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir);
        assert!(!cache.was_dependency_changed(["a", "b"]));

        cache.mark_regenerated("b");
        assert!(cache.was_dependency_changed(["a", "b"]));
        assert!(!cache.was_dependency_changed(["a", "c"]));
    }

    #[test]
    fn corrupt_cache_starts_empty() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir);
        fs::write(dir.path().join(".cache/summary_cache.json"), "{not json").unwrap();
        cache.load();
        assert!(cache.is_empty());
    }

    #[test]
    fn update_merges_fields() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with(&dir);
        cache.update(
            "id",
            CacheEntry { code_analysis: Some("a".into()), code_hash: Some("h".into()), ..Default::default() },
        );
        cache.update("id", entry("s"));

        let merged = cache.entry("id");
        assert_eq!(merged.summary.as_deref(), Some("s"));
        assert_eq!(merged.code_analysis.as_deref(), Some("a"));
        assert_eq!(merged.code_hash.as_deref(), Some("h"));
    }
}
