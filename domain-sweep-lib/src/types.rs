//! Core data types for candidate generation and availability checking.
//!
//! This module defines the value types shared by the generator, the caches,
//! the checker and the report: availability statuses, lookup sources,
//! candidate domains, per-domain check results and the run configurations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Availability status of a domain.
///
/// `Error` only appears in per-run results; the lookup cache stores failed
/// lookups as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Available,
    Taken,
    Unknown,
    Error,
}

impl Status {
    /// Status to persist in the lookup cache for this outcome.
    pub fn cacheable(self) -> Status {
        match self {
            Status::Error => Status::Unknown,
            other => other,
        }
    }
}

/// Which lookup tier produced a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupSource {
    /// The WHOIS protocol (primary)
    Whois,
    /// The Domainr availability API (fallback)
    Api,
}

/// Outcome of classifying a single raw lookup response.
///
/// Classifiers are pure functions from response text/JSON to a verdict,
/// kept apart from the network code so they can be tested with fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Available,
    Taken,
    /// No decision could be made; the reason is kept for the report
    Inconclusive(String),
}

/// A generated SLD/TLD pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateDomain {
    pub sld: String,
    pub tld: String,
    /// Lowercase `sld + "." + tld`
    pub full: String,
}

impl CandidateDomain {
    /// Build a candidate, normalizing both labels to lowercase.
    pub fn new(sld: &str, tld: &str) -> Self {
        let sld = sld.to_lowercase();
        let tld = tld.to_lowercase();
        let full = format!("{}.{}", sld, tld);
        Self { sld, tld, full }
    }
}

impl std::fmt::Display for CandidateDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Result of checking one domain in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The domain that was checked (e.g., "ab.us")
    pub domain: String,

    /// Final status of the domain for this run
    pub status: Status,

    /// Lookup tier the status came from
    pub source: LookupSource,

    /// When the status was determined (the original time for cache hits)
    pub checked_at: DateTime<Utc>,

    /// Whether the status was served from the lookup cache
    #[serde(default)]
    pub cached: bool,

    /// Failure details for `error`/`unknown` outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// Credential scheme for the Domainr API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    /// Keys are RapidAPI keys sent as `X-RapidAPI-Key`
    #[serde(alias = "rapid")]
    RapidApi,
    /// Keys are Domainr client ids sent as the `client_id` parameter
    #[serde(alias = "client_id", alias = "domainr")]
    Direct,
}

impl std::str::FromStr for ApiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rapidapi" | "rapid" => Ok(ApiType::RapidApi),
            "direct" | "client_id" | "domainr" => Ok(ApiType::Direct),
            other => Err(format!(
                "unknown domainr_api_type '{}', expected 'rapidapi' or 'direct'",
                other
            )),
        }
    }
}

/// Configuration for availability checking.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Number of concurrent lookup workers
    /// Default: 10, Range: 1-100
    pub thread_count: usize,

    /// Timeout for each individual network call (WHOIS or API)
    /// Default: 10 seconds
    pub check_timeout: Duration,

    /// Freshness window of the lookup cache
    /// Default: 7 days
    pub max_cache_age_days: u32,

    /// Domainr credential scheme
    pub api_type: ApiType,

    /// Domainr credentials, rotated round-robin; empty disables the fallback
    pub api_keys: Vec<String>,

    /// Base URL of the Domainr status endpoint
    pub api_url: String,

    /// Name or path of the system WHOIS client
    pub whois_command: String,

    /// Persist the lookup cache after this many writes (0 = only at the end)
    pub save_interval: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            thread_count: 10,
            check_timeout: Duration::from_secs(10),
            max_cache_age_days: 7,
            api_type: ApiType::RapidApi,
            api_keys: Vec::new(),
            api_url: crate::protocols::domainr::DEFAULT_DOMAINR_URL.to_string(),
            whois_command: "whois".to_string(),
            save_interval: 100,
        }
    }
}

impl CheckConfig {
    /// Set the worker count, capped at 100 to avoid hammering WHOIS servers.
    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count.clamp(1, 100);
        self
    }

    /// Set the per-call timeout.
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Set the lookup cache freshness window.
    pub fn with_max_cache_age_days(mut self, days: u32) -> Self {
        self.max_cache_age_days = days;
        self
    }

    /// Persist the lookup cache every `interval` writes (0 disables).
    pub fn with_save_interval(mut self, interval: usize) -> Self {
        self.save_interval = interval;
        self
    }

    /// Configure the Domainr fallback.
    pub fn with_api(mut self, api_type: ApiType, api_keys: Vec<String>) -> Self {
        self.api_type = api_type;
        self.api_keys = api_keys;
        self
    }

    /// Whether a fallback tier is available.
    pub fn has_api_fallback(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

/// Configuration for candidate generation.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Shortest SLD to generate
    pub min_sld_length: usize,

    /// Longest SLD to generate (defaults to `min_sld_length`)
    pub max_sld_length: usize,

    /// Shortest TLD to pair with
    pub min_tld_length: usize,

    /// SLDs must start with this prefix
    pub prefix_domain: Option<String>,

    /// TLDs must start with this prefix
    pub prefix_tld: Option<String>,

    /// Only keep pairs whose `sld + tld` is a dictionary word
    pub only_words: bool,

    /// Length of the words the word filter accepts
    pub target_word_length: usize,

    /// Registry minimum SLD length per TLD (e.g. `us = 3`)
    pub tld_min_sld_length: HashMap<String, usize>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            min_sld_length: 2,
            max_sld_length: 2,
            min_tld_length: 2,
            prefix_domain: None,
            prefix_tld: None,
            only_words: false,
            target_word_length: 4,
            tld_min_sld_length: HashMap::new(),
        }
    }
}

impl GenerateConfig {
    /// Restrict SLDs to those starting with `prefix`.
    pub fn with_prefix_domain<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into().trim().to_lowercase();
        self.prefix_domain = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Restrict TLDs to those starting with `prefix`.
    pub fn with_prefix_tld<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into().trim().to_lowercase();
        self.prefix_tld = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Enable or disable the dictionary word filter.
    pub fn with_only_words(mut self, only_words: bool) -> Self {
        self.only_words = only_words;
        self
    }

    /// Set the SLD length range.
    pub fn with_sld_lengths(mut self, min: usize, max: usize) -> Self {
        self.min_sld_length = min;
        self.max_sld_length = max;
        self
    }
}

/// File locations for persisted state and outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePaths {
    pub tld_cache_file: PathBuf,
    pub lookup_cache_file: PathBuf,
    pub reserved_file: PathBuf,
    pub word_list_file: Option<PathBuf>,
    pub generated_domains_file: PathBuf,
    pub results_file: PathBuf,
    pub available_file: PathBuf,
}

impl Default for StatePaths {
    fn default() -> Self {
        Self {
            tld_cache_file: PathBuf::from("tld_list.json"),
            lookup_cache_file: PathBuf::from("output/domain_status.json"),
            reserved_file: PathBuf::from("reserved_domains.json"),
            word_list_file: None,
            generated_domains_file: PathBuf::from("output/generated_domains.txt"),
            results_file: PathBuf::from("domain_results.json"),
            available_file: PathBuf::from("output/available_domains.txt"),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Available => write!(f, "available"),
            Status::Taken => write!(f, "taken"),
            Status::Unknown => write!(f, "unknown"),
            Status::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupSource::Whois => write!(f, "WHOIS"),
            LookupSource::Api => write!(f, "API"),
        }
    }
}
