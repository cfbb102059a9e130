//! Persisted per-domain lookup results.
//!
//! The cache maps a domain to the last resolved status, the tier that
//! produced it and when. Entries are trusted for `max_cache_age_days`; older
//! entries are ignored by reads and dropped by `prune_expired`.

use crate::error::DomainSweepError;
use crate::types::{LookupSource, Status};
use crate::utils::write_atomic;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// One cached lookup. The domain is the key of the persisted map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupCacheEntry {
    pub status: Status,
    pub source: LookupSource,
    pub checked_at: DateTime<Utc>,
    /// Why the lookup did not resolve, for `unknown` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// Shared lookup cache store.
///
/// All reads and writes go through one mutex; each call is a single critical
/// section, so concurrent workers never observe a half-applied update.
#[derive(Debug)]
pub struct LookupCache {
    path: Option<PathBuf>,
    max_age: ChronoDuration,
    entries: Mutex<HashMap<String, LookupCacheEntry>>,
    pending_writes: AtomicUsize,
    persist_lock: Mutex<()>,
}

impl LookupCache {
    /// An in-memory cache that is never written to disk.
    pub fn in_memory(max_cache_age_days: u32) -> Self {
        Self {
            path: None,
            max_age: ChronoDuration::days(i64::from(max_cache_age_days)),
            entries: Mutex::new(HashMap::new()),
            pending_writes: AtomicUsize::new(0),
            persist_lock: Mutex::new(()),
        }
    }

    /// Load the cache file at `path`.
    ///
    /// A missing file starts an empty cache. A corrupt file is logged and
    /// replaced by an empty cache on the next persist.
    pub fn load<P: Into<PathBuf>>(path: P, max_cache_age_days: u32) -> Self {
        let path = path.into();
        let mut cache = Self::in_memory(max_cache_age_days);
        let entries = read_cache_file(&path);
        if !entries.is_empty() {
            info!(
                "Loaded {} cached lookups from {}",
                entries.len(),
                path.display()
            );
        }
        cache.entries = Mutex::new(entries);
        cache.path = Some(path);
        cache
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `domain` has an entry inside the freshness window.
    pub fn is_fresh(&self, domain: &str) -> bool {
        self.get(domain).is_some()
    }

    pub fn is_fresh_at(&self, domain: &str, now: DateTime<Utc>) -> bool {
        self.get_at(domain, now).is_some()
    }

    /// The cached entry for `domain`, if it is still fresh.
    pub fn get(&self, domain: &str) -> Option<LookupCacheEntry> {
        self.get_at(domain, Utc::now())
    }

    pub fn get_at(&self, domain: &str, now: DateTime<Utc>) -> Option<LookupCacheEntry> {
        let entries = self.lock_entries();
        entries
            .get(domain)
            .filter(|entry| now - entry.checked_at <= self.max_age)
            .cloned()
    }

    /// Record a resolved lookup, stamped now.
    ///
    /// `Error` statuses are stored as `Unknown`. Returns the number of writes
    /// since the last persist.
    pub fn put(&self, domain: &str, status: Status, source: LookupSource) -> usize {
        self.insert_entry(
            domain,
            LookupCacheEntry {
                status: status.cacheable(),
                source,
                checked_at: Utc::now(),
                error_detail: None,
            },
        )
    }

    /// Insert a prepared entry, overwriting any previous one.
    pub fn insert_entry(&self, domain: &str, entry: LookupCacheEntry) -> usize {
        debug!("Caching {} as {} ({})", domain, entry.status, entry.source);
        self.lock_entries().insert(domain.to_lowercase(), entry);
        self.pending_writes.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop every entry outside the freshness window. Returns how many went.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now())
    }

    pub fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.checked_at <= self.max_age);
        before - entries.len()
    }

    /// Writes since the last successful persist.
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.load(Ordering::SeqCst)
    }

    /// Persist once `save_interval` writes have piled up (0 disables).
    ///
    /// The pending count is re-checked under the persist lock, so when many
    /// workers find a save due at once only the first one writes the file.
    /// Returns whether this call wrote it.
    pub fn persist_if_due(&self, save_interval: usize) -> Result<bool, DomainSweepError> {
        if save_interval == 0 || self.pending_writes() < save_interval {
            return Ok(false);
        }
        let Some(path) = &self.path else {
            return Ok(false);
        };

        let _guard = self.lock_persist();
        if self.pending_writes() < save_interval {
            return Ok(false);
        }
        self.write_locked(path)?;
        Ok(true)
    }

    /// Write the cache to its file, sorted by domain.
    pub fn persist(&self) -> Result<(), DomainSweepError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _guard = self.lock_persist();
        self.write_locked(path)
    }

    /// Caller holds `persist_lock`.
    fn write_locked(&self, path: &Path) -> Result<(), DomainSweepError> {
        let snapshot: BTreeMap<String, LookupCacheEntry> = self
            .lock_entries()
            .iter()
            .map(|(domain, entry)| (domain.clone(), entry.clone()))
            .collect();
        let written = self.pending_writes.swap(0, Ordering::SeqCst);

        let content = serde_json::to_string_pretty(&snapshot)?;
        if let Err(e) = write_atomic(path, &content) {
            self.pending_writes.fetch_add(written, Ordering::SeqCst);
            return Err(e);
        }
        debug!("Persisted {} lookups to {}", snapshot.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_persist(&self) -> MutexGuard<'_, ()> {
        self.persist_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, LookupCacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_cache_file(path: &Path) -> HashMap<String, LookupCacheEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            warn!("Error reading lookup cache {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Lookup cache {} is corrupt ({}); starting empty",
                path.display(),
                e
            );
            HashMap::new()
        }
    }
}
