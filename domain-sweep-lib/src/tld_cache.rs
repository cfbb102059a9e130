//! Locally cached list of valid TLDs.
//!
//! The list is fetched from IANA and persisted as a single document with one
//! `fetched_at` timestamp. The whole list is refreshed once it is older than
//! the freshness window; a failed refresh falls back to the stale copy.

use crate::error::DomainSweepError;
use crate::utils::write_atomic;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// IANA's canonical list of delegated TLDs.
pub const DEFAULT_TLD_SOURCE_URL: &str = "https://data.iana.org/TLD/tlds-alpha-by-domain.txt";

lazy_static::lazy_static! {
    static ref TLD_TOKEN: Regex = Regex::new(r"^[a-z]{2,63}$").expect("valid TLD regex");
}

/// Where fresh TLD lists come from.
#[async_trait]
pub trait TldSource: Send + Sync {
    /// Fetch and normalize the current TLD list.
    async fn fetch(&self) -> Result<Vec<String>, DomainSweepError>;

    /// Human-readable source name for logs and errors.
    fn name(&self) -> &str;
}

/// Fetches the TLD list over HTTP.
pub struct IanaTldSource {
    http_client: reqwest::Client,
    url: String,
}

impl IanaTldSource {
    /// Create a source for the given URL with a request timeout.
    pub fn new<U: Into<String>>(url: U, timeout: Duration) -> Result<Self, DomainSweepError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainSweepError::network_with_source(
                    "Failed to create TLD list HTTP client",
                    e.to_string(),
                )
            })?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TldSource for IanaTldSource {
    async fn fetch(&self) -> Result<Vec<String>, DomainSweepError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DomainSweepError::source_unavailable(&self.url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(DomainSweepError::source_unavailable(
                &self.url,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomainSweepError::source_unavailable(&self.url, e.to_string()))?;

        let tlds = parse_tld_list(&body);
        if tlds.is_empty() {
            return Err(DomainSweepError::source_unavailable(
                &self.url,
                "TLD list contained no usable entries",
            ));
        }
        Ok(tlds)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Normalize a raw TLD list.
///
/// Drops `#` comment lines, blank lines and anything that is not a plain
/// alphabetic label (IDN `xn--` entries included), lowercases the rest and
/// removes duplicates while keeping the source order.
pub fn parse_tld_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_start_matches('.').to_lowercase())
        .filter(|tld| TLD_TOKEN.is_match(tld))
        .filter(|tld| seen.insert(tld.clone()))
        .collect()
}

/// Persisted form of the TLD cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TldCacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub tlds: Vec<String>,
}

/// Older cache files hold a bare JSON array; their age is the file mtime.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTldCache {
    Entry(TldCacheEntry),
    Bare(Vec<String>),
}

/// TLD list store with a load/refresh/persist lifecycle.
#[derive(Debug, Clone)]
pub struct TldCache {
    path: PathBuf,
    max_age: ChronoDuration,
    entry: Option<TldCacheEntry>,
}

impl TldCache {
    /// Create an empty cache that persists to `path`.
    pub fn new<P: Into<PathBuf>>(path: P, max_cache_age_days: u32) -> Self {
        Self {
            path: path.into(),
            max_age: ChronoDuration::days(i64::from(max_cache_age_days)),
            entry: None,
        }
    }

    /// Load the cache file if there is one.
    ///
    /// An unreadable or corrupt file is treated as absent (with a warning),
    /// so the next `get_valid_tlds` call refreshes it.
    pub fn load<P: Into<PathBuf>>(path: P, max_cache_age_days: u32) -> Self {
        let mut cache = Self::new(path, max_cache_age_days);
        cache.entry = read_cache_file(&cache.path);
        cache
    }

    /// The cached entry, fresh or not.
    pub fn entry(&self) -> Option<&TldCacheEntry> {
        self.entry.as_ref()
    }

    /// Replace the cached list, stamping it with `fetched_at`.
    pub fn set(&mut self, tlds: Vec<String>, fetched_at: DateTime<Utc>) {
        self.entry = Some(TldCacheEntry { fetched_at, tlds });
    }

    /// Whether the cache must be refreshed at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match &self.entry {
            Some(entry) => entry.tlds.is_empty() || now - entry.fetched_at > self.max_age,
            None => true,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    /// Return the TLD list, refreshing it from `source` first when stale.
    ///
    /// # Errors
    ///
    /// `SourceUnavailable` when the refresh fails and no cached list exists.
    pub async fn get_valid_tlds(
        &mut self,
        source: &dyn TldSource,
    ) -> Result<Vec<String>, DomainSweepError> {
        self.get_valid_tlds_at(source, Utc::now()).await
    }

    /// `get_valid_tlds` with an explicit clock.
    pub async fn get_valid_tlds_at(
        &mut self,
        source: &dyn TldSource,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, DomainSweepError> {
        if !self.is_stale_at(now) {
            debug!("Using cached TLD list from {}", self.path.display());
            return Ok(self.cached_tlds());
        }

        info!("TLD cache is stale or missing; fetching from {}", source.name());
        match self.refresh_at(source, now).await {
            Ok(()) => Ok(self.cached_tlds()),
            Err(e) => match &self.entry {
                Some(entry) if !entry.tlds.is_empty() => {
                    warn!(
                        "TLD refresh failed ({}); using stale list fetched at {}",
                        e, entry.fetched_at
                    );
                    Ok(entry.tlds.clone())
                }
                _ => Err(DomainSweepError::source_unavailable(
                    source.name(),
                    format!("no cached TLD list and refresh failed: {}", e),
                )),
            },
        }
    }

    /// Fetch a new list and persist it.
    pub async fn refresh(&mut self, source: &dyn TldSource) -> Result<(), DomainSweepError> {
        self.refresh_at(source, Utc::now()).await
    }

    async fn refresh_at(
        &mut self,
        source: &dyn TldSource,
        now: DateTime<Utc>,
    ) -> Result<(), DomainSweepError> {
        let tlds = source.fetch().await?;
        if tlds.is_empty() {
            return Err(DomainSweepError::source_unavailable(
                source.name(),
                "source returned an empty TLD list",
            ));
        }
        info!("Fetched {} TLDs from {}", tlds.len(), source.name());
        self.set(tlds, now);
        if let Err(e) = self.persist() {
            warn!("Failed to persist TLD cache: {}", e);
        }
        Ok(())
    }

    /// Write the cache to disk.
    pub fn persist(&self) -> Result<(), DomainSweepError> {
        let Some(entry) = &self.entry else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(entry)?;
        write_atomic(&self.path, &content)
    }

    fn cached_tlds(&self) -> Vec<String> {
        self.entry
            .as_ref()
            .map(|entry| entry.tlds.clone())
            .unwrap_or_default()
    }
}

fn read_cache_file(path: &Path) -> Option<TldCacheEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Error reading TLD cache {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<StoredTldCache>(&content) {
        Ok(StoredTldCache::Entry(entry)) => Some(entry),
        Ok(StoredTldCache::Bare(tlds)) => {
            let fetched_at = std::fs::metadata(path)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            Some(TldCacheEntry { fetched_at, tlds })
        }
        Err(e) => {
            warn!("Ignoring corrupt TLD cache {}: {}", path.display(), e);
            None
        }
    }
}
