//! Run report: one entry per checked domain plus run-level counts.
//!
//! Results arrive in completion order from the worker pool; the report keys
//! them by domain in a `BTreeMap`, so the serialized form is independent of
//! scheduling. Cache hits carry their original `checked_at` and the report
//! holds no wall-clock run metadata, which makes reruns over a fresh cache
//! produce the same document.

use crate::error::DomainSweepError;
use crate::score::score_domain;
use crate::types::{CheckResult, LookupSource, Status};
use crate::utils::{write_atomic, write_lines};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Per-domain entry of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub status: Status,
    pub source: LookupSource,
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Served from the lookup cache in this run (not persisted)
    #[serde(skip)]
    pub cached: bool,
}

/// Run-level counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub available: usize,
    pub taken: usize,
    pub unknown: usize,
    pub error: usize,
    /// Cache hits in this run (not persisted)
    #[serde(skip)]
    pub cached: usize,
}

impl Summary {
    fn add(&mut self, entry: &ReportEntry) {
        self.total += 1;
        *self.slot(entry.status) += 1;
        if entry.cached {
            self.cached += 1;
        }
    }

    fn remove(&mut self, entry: &ReportEntry) {
        self.total -= 1;
        *self.slot(entry.status) -= 1;
        if entry.cached {
            self.cached -= 1;
        }
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Available => &mut self.available,
            Status::Taken => &mut self.taken,
            Status::Unknown => &mut self.unknown,
            Status::Error => &mut self.error,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Checked {} domains: {} available, {} taken, {} unknown, {} errors ({} from cache)",
            self.total, self.available, self.taken, self.unknown, self.error, self.cached
        )
    }
}

/// The persisted run report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub results: BTreeMap<String, ReportEntry>,
}

impl Report {
    /// Insert or replace the result for a domain, keeping counts in step.
    pub fn record(&mut self, result: CheckResult) {
        let entry = ReportEntry {
            status: result.status,
            source: result.source,
            checked_at: result.checked_at,
            error_detail: result.error_detail,
            cached: result.cached,
        };
        self.summary.add(&entry);
        if let Some(previous) = self.results.insert(result.domain, entry) {
            self.summary.remove(&previous);
        }
    }

    pub fn get(&self, domain: &str) -> Option<&ReportEntry> {
        self.results.get(domain)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Available domains in sorted order.
    pub fn available_domains(&self) -> Vec<&str> {
        self.domains_with(Status::Available)
    }

    pub fn domains_with(&self, status: Status) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(domain, _)| domain.as_str())
            .collect()
    }

    /// Domains available now that were not available in `previous`.
    pub fn newly_available<'a>(&'a self, previous: &Report) -> Vec<&'a str> {
        self.available_domains()
            .into_iter()
            .filter(|domain| {
                previous
                    .get(domain)
                    .map(|entry| entry.status != Status::Available)
                    .unwrap_or(true)
            })
            .collect()
    }

    /// Load a saved report.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DomainSweepError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read report: {}", e),
            )
        })?;
        let mut report: Report = serde_json::from_str(&content)?;
        report.recount();
        Ok(report)
    }

    /// Load the previous run's report if one is readable.
    pub fn load_previous<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return None;
        }
        match Self::load(path) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Ignoring previous report {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Save the report as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DomainSweepError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, &content)?;
        info!("Results saved to {}", path.display());
        Ok(())
    }

    /// Write `<domain> (Score: N)` for every available domain.
    pub fn write_available<P: AsRef<Path>>(&self, path: P) -> Result<usize, DomainSweepError> {
        write_lines(
            path,
            self.available_domains()
                .into_iter()
                .map(|domain| format!("{} (Score: {})", domain, score_domain(domain))),
        )
    }

    fn recount(&mut self) {
        let mut summary = Summary::default();
        for entry in self.results.values() {
            summary.add(entry);
        }
        self.summary = summary;
    }
}

/// Collects check results into a [`Report`].
#[derive(Debug, Default)]
pub struct ResultAggregator {
    report: Report,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one result; a repeated domain replaces its earlier entry.
    pub fn record(&mut self, result: CheckResult) {
        self.report.record(result);
    }

    pub fn finish(self) -> Report {
        self.report
    }
}
