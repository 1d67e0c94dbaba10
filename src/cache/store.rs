use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::core::error::Result;
use crate::core::types::LinkStatus;

/// Status recorded for a cached link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Ok,
    Broken,
    Excluded,
}

/// One cached validation result, stored as one JSON line in the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalized link this entry belongs to
    pub key: String,
    pub status: CacheStatus,
    /// Detail text of a broken link, replayed into the report on a hit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
    #[serde(rename = "ttl_secs", with = "ttl_secs")]
    pub ttl: Duration,
}

/// TTLs are stored as whole seconds.
mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, status: CacheStatus, detail: Option<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            status,
            detail,
            checked_at: Utc::now(),
            ttl,
        }
    }

    /// Build an entry from a validation result. Indeterminate results are
    /// never cached, so `Error` yields `None`.
    pub fn from_status(key: impl Into<String>, status: &LinkStatus, ttl: Duration) -> Option<Self> {
        let (status, detail) = match status {
            LinkStatus::Ok => (CacheStatus::Ok, None),
            LinkStatus::Broken(detail) => (CacheStatus::Broken, Some(detail.clone())),
            LinkStatus::Excluded => (CacheStatus::Excluded, None),
            LinkStatus::Error(_) => return None,
        };
        Some(Self::new(key, status, detail, ttl))
    }

    /// Instant after which the entry counts as absent. `None` when the ttl
    /// is too large to represent, i.e. the entry never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.ttl).ok()?;
        self.checked_at.checked_add_signed(ttl)
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires| now < expires)
    }

    pub fn to_status(&self) -> LinkStatus {
        match self.status {
            CacheStatus::Ok => LinkStatus::Ok,
            CacheStatus::Broken => {
                LinkStatus::Broken(self.detail.clone().unwrap_or_else(|| "broken".to_string()))
            }
            CacheStatus::Excluded => LinkStatus::Excluded,
        }
    }
}

struct State {
    entries: FxHashMap<String, CacheEntry>,
    journal: Option<BufWriter<File>>,
}

/// Validation results persisted across runs.
///
/// Lookups share a read guard; every write goes through the write guard,
/// which also owns the on-disk journal, so there is exactly one writer at
/// a time. Each write is appended to the cache file immediately, so a run
/// that dies half way keeps the results it already had.
pub struct CacheStore {
    path: Option<PathBuf>,
    state: RwLock<State>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("path", &self.path)
            .field("entries", &self.len())
            .finish()
    }
}

impl CacheStore {
    /// A cache that lives only for this process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(State {
                entries: FxHashMap::default(),
                journal: None,
            }),
        }
    }

    /// Load the cache file at `path`. Never fails: a missing or unreadable
    /// file gives an empty cache and malformed records are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut entries = FxHashMap::default();

        match fs::read_to_string(&path) {
            Ok(content) => {
                for (index, line) in content.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<CacheEntry>(line) {
                        // Journal order: later records win
                        Ok(entry) => {
                            entries.insert(entry.key.clone(), entry);
                        }
                        Err(e) => log::warn!(
                            "Skipping malformed cache record {}:{}: {e}",
                            path.display(),
                            index + 1
                        ),
                    }
                }
                log::debug!("Loaded {} cache entries from {}", entries.len(), path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No cache at {}, starting cold", path.display());
            }
            Err(e) => {
                log::warn!("Could not read cache {}: {e}; starting cold", path.display());
            }
        }

        let journal = open_journal(&path);
        Self {
            path: Some(path),
            state: RwLock::new(State { entries, journal }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Fresh entry for `key`, or `None` on a miss or an expired entry.
    pub fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.lookup_at(key, Utc::now())
    }

    pub fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .cloned()
    }

    /// Upsert an entry; last write wins. Visible to lookups as soon as this
    /// returns.
    pub fn write(&self, entry: CacheEntry) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(journal) = state.journal.as_mut()
            && let Err(e) = append_record(journal, &entry)
        {
            log::warn!("Cache journal write failed, continuing in memory: {e}");
            state.journal = None;
        }

        state.entries.insert(entry.key.clone(), entry);
    }

    /// Rewrite the cache file with one record per live key.
    ///
    /// The file is replaced atomically, and expired entries are dropped.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();

        let mut live: Vec<&CacheEntry> = state
            .entries
            .values()
            .filter(|entry| entry.is_fresh_at(now))
            .collect();
        live.sort_by(|a, b| a.key.cmp(&b.key));

        let tmp_path = temp_path_for(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for entry in &live {
                append_record(&mut writer, entry)?;
            }
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        }
        let persisted = live.len();

        // The old journal handle points at the replaced file
        state.journal = None;
        fs::rename(&tmp_path, path)?;
        state.journal = open_journal(path);

        log::debug!("Persisted {persisted} cache entries to {}", path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, expired ones included, sorted by key.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<CacheEntry> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

fn append_record<W: Write>(writer: &mut W, entry: &CacheEntry) -> std::io::Result<()> {
    let line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn open_journal(path: &Path) -> Option<BufWriter<File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = fs::create_dir_all(parent)
    {
        log::warn!("Could not create cache directory {}: {e}", parent.display());
        return None;
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(BufWriter::new(file)),
        Err(e) => {
            log::warn!("Could not open cache {} for writing: {e}", path.display());
            None
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn entry_checked_at(key: &str, status: CacheStatus, checked_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            status,
            detail: None,
            checked_at,
            ttl: HOUR,
        }
    }

    #[test]
    fn test_lookup__fresh_write_is_visible() {
        let store = CacheStore::in_memory();
        assert!(store.lookup("https://example.com/").is_none());

        store.write(CacheEntry::new("https://example.com/", CacheStatus::Ok, None, HOUR));

        let hit = store.lookup("https://example.com/").expect("entry should be visible");
        assert_eq!(hit.status, CacheStatus::Ok);
    }

    #[test]
    fn test_lookup__expired_entry_is_absent() {
        let store = CacheStore::in_memory();
        let checked_at = Utc::now() - chrono::Duration::hours(2);
        store.write(entry_checked_at("k", CacheStatus::Ok, checked_at));

        assert!(store.lookup("k").is_none());
        // Still held until persist compacts it away
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_at__expiry_boundary() {
        let store = CacheStore::in_memory();
        let checked_at = Utc::now();
        store.write(entry_checked_at("k", CacheStatus::Ok, checked_at));

        let just_before = checked_at + chrono::Duration::seconds(3599);
        let exactly = checked_at + chrono::Duration::seconds(3600);

        assert!(store.lookup_at("k", just_before).is_some());
        assert!(store.lookup_at("k", exactly).is_none());
    }

    #[test]
    fn test_write__last_write_wins() {
        let store = CacheStore::in_memory();
        store.write(CacheEntry::new("k", CacheStatus::Ok, None, HOUR));
        store.write(CacheEntry::new(
            "k",
            CacheStatus::Broken,
            Some("HTTP 404".to_string()),
            HOUR,
        ));

        let hit = store.lookup("k").unwrap();
        assert_eq!(hit.to_status(), LinkStatus::Broken("HTTP 404".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_status__errors_are_not_cached() {
        assert!(CacheEntry::from_status("k", &LinkStatus::Error("dns".into()), HOUR).is_none());
        let broken = CacheEntry::from_status("k", &LinkStatus::Broken("HTTP 500".into()), HOUR).unwrap();
        assert_eq!(broken.detail.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_load__missing_file_starts_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = CacheStore::load(dir.path().join("nested/cache.jsonl"));
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_load__skips_malformed_records() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cache.jsonl");
        let good = serde_json::to_string(&CacheEntry::new("good", CacheStatus::Ok, None, HOUR))?;
        fs::write(&path, format!("{{not json\n{good}\n\n"))?;

        let store = CacheStore::load(&path);

        assert_eq!(store.len(), 1);
        assert!(store.lookup("good").is_some());
        Ok(())
    }

    #[test]
    fn test_record_format__ttl_in_seconds() -> Result<()> {
        let entry = CacheEntry::new("https://example.com/", CacheStatus::Ok, None, HOUR);

        let line = serde_json::to_string(&entry)?;
        assert!(line.contains("\"ttl_secs\":3600"));
        assert!(!line.contains("nanos"));

        let parsed: CacheEntry = serde_json::from_str(&line)?;
        assert_eq!(parsed, entry);
        Ok(())
    }

    #[test]
    fn test_persist_then_load__round_trips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cache.jsonl");

        let store = CacheStore::load(&path);
        store.write(CacheEntry::new("a", CacheStatus::Ok, None, HOUR));
        store.write(CacheEntry::new(
            "b",
            CacheStatus::Broken,
            Some("file not found".to_string()),
            Duration::from_secs(7200),
        ));
        store.write(CacheEntry::new("c", CacheStatus::Excluded, None, HOUR));
        store.persist()?;

        let reloaded = CacheStore::load(&path);
        assert_eq!(reloaded.entries(), store.entries());
        Ok(())
    }

    #[test]
    fn test_persist__compacts_and_drops_expired() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cache.jsonl");

        let store = CacheStore::load(&path);
        store.write(CacheEntry::new("a", CacheStatus::Ok, None, HOUR));
        store.write(CacheEntry::new("a", CacheStatus::Ok, None, HOUR));
        store.write(entry_checked_at(
            "stale",
            CacheStatus::Ok,
            Utc::now() - chrono::Duration::hours(3),
        ));
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 3);

        store.persist()?;

        let content = fs::read_to_string(&path)?;
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"a\""));

        // Writes after a persist land in the new file
        store.write(CacheEntry::new("b", CacheStatus::Ok, None, HOUR));
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_journal__survives_without_persist() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cache.jsonl");

        {
            let store = CacheStore::load(&path);
            store.write(CacheEntry::new("partial", CacheStatus::Ok, None, HOUR));
            // dropped without persist, as if the run crashed
        }

        let recovered = CacheStore::load(&path);
        assert!(recovered.lookup("partial").is_some());
        Ok(())
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = Arc::new(CacheStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let key = format!("key-{i}");
                    store.write(CacheEntry::new(key.clone(), CacheStatus::Ok, None, HOUR));
                    store.lookup(&key).is_some()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(store.len(), 8);
    }
}
