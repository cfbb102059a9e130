//! Reserved names that must never be generated.
//!
//! The reserved list is maintained by an external updater job, which writes
//! `{ "last_updated": "...", "reserved": ["nic", "www", ...] }`. This crate
//! only reads it.

use crate::error::DomainSweepError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct ReservedFile {
    #[serde(default)]
    reserved: Vec<String>,
}

/// Read-only set of reserved names.
///
/// Entries may be bare labels (`"nic"`), concatenations (`"nicus"`) or full
/// domains (`"nic.us"`); all are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ReservedSet {
    names: HashSet<String>,
}

impl ReservedSet {
    /// Build a set from any list of names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Load the reserved file.
    ///
    /// A missing file yields an empty set with a warning. A file that exists
    /// but cannot be parsed is an error, since silently generating reserved
    /// names would defeat the purpose of the list.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DomainSweepError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Reserved file {} not found. Using empty reserved list.",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read reserved file: {}", e),
            )
        })?;
        let parsed: ReservedFile = serde_json::from_str(&content)?;
        let set = Self::new(parsed.reserved);
        info!("Loaded {} reserved names from {}", set.len(), path.display());
        Ok(set)
    }

    /// Whether the SLD/TLD pair is excluded.
    ///
    /// A pair is excluded when the SLD equals the TLD, or when the SLD, the
    /// TLD, their concatenation or the full domain is in the set.
    pub fn excludes(&self, sld: &str, tld: &str) -> bool {
        if sld == tld {
            return true;
        }
        if self.names.is_empty() {
            return false;
        }
        self.names.contains(sld)
            || self.names.contains(tld)
            || self.names.contains(&format!("{}{}", sld, tld))
            || self.names.contains(&format!("{}.{}", sld, tld))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_rules() {
        let reserved = ReservedSet::new(["nic", "TEST", "abus", "xy.io"]);

        assert!(reserved.excludes("nic", "us"));
        assert!(reserved.excludes("ab", "test"));
        assert!(reserved.excludes("ab", "us"));
        assert!(reserved.excludes("xy", "io"));
        assert!(reserved.excludes("us", "us"));

        assert!(!reserved.excludes("ab", "io"));
        assert!(!reserved.excludes("xy", "us"));
    }

    #[test]
    fn test_empty_set_only_excludes_same_labels() {
        let reserved = ReservedSet::default();
        assert!(!reserved.excludes("ab", "us"));
        assert!(reserved.excludes("io", "io"));
    }

    #[test]
    fn test_load_reserved_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reserved_domains.json");
        std::fs::write(
            &path,
            r#"{"last_updated": "2026-10-01T00:00:00+00:00", "reserved": ["www", "Mail", ""]}"#,
        )
        .unwrap();

        let reserved = ReservedSet::load(&path).unwrap();
        assert_eq!(reserved.len(), 2);
        assert!(reserved.excludes("mail", "io"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reserved = ReservedSet::load(dir.path().join("absent.json")).unwrap();
        assert!(reserved.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reserved_domains.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ReservedSet::load(&path).is_err());
    }
}
