//! # Domain Sweep Library
//!
//! Generates every short `sld.tld` candidate for a set of length and prefix
//! constraints and checks which ones are unregistered, using WHOIS first and
//! the Domainr API as a fallback.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::{AvailabilityChecker, CheckConfig, LookupCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(LookupCache::in_memory(7));
//!     let checker = AvailabilityChecker::new(CheckConfig::default(), cache)?;
//!     let report = checker.check_all(vec!["ab.us".to_string()]).await?;
//!
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Candidate generation**: lazy odometer over `a-z` SLDs paired with
//!   the IANA TLD list, with reserved-name and dictionary-word filters
//! - **Two-tier lookups**: WHOIS, then Domainr for inconclusive answers
//! - **Caching**: a TLD list cache and a per-domain lookup cache, both
//!   persisted as JSON with a freshness window
//! - **Bounded concurrency**: fixed worker pool over a bounded queue

pub use checker::AvailabilityChecker;
pub use config::{
    load_env_config, ConfigManager, EnvConfig, FileConfig, NotificationSettings, Settings,
};
pub use error::DomainSweepError;
pub use generate::{Candidates, DomainGenerator};
pub use lookup_cache::{LookupCache, LookupCacheEntry};
pub use pool::{PoolStats, WorkerPool};
pub use protocols::{DomainLookup, DomainrClient, WhoisClient};
pub use report::{Report, ReportEntry, ResultAggregator, Summary};
pub use reserved::ReservedSet;
pub use score::score_domain;
pub use tld_cache::{IanaTldSource, TldCache, TldSource, DEFAULT_TLD_SOURCE_URL};
pub use types::{
    ApiType, CandidateDomain, CheckConfig, CheckResult, GenerateConfig, LookupSource,
    StatePaths, Status, Verdict,
};
pub use utils::{read_domain_file, validate_domain};
pub use words::WordList;

pub mod config;
pub mod generate;
pub mod protocols;

mod checker;
mod error;
mod lookup_cache;
mod pool;
mod report;
mod reserved;
mod score;
mod tld_cache;
mod types;
mod utils;
mod words;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DomainSweepError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
}

#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "whois")]
    features.push("whois");

    #[cfg(feature = "domainr")]
    features.push("domainr");

    features
}
