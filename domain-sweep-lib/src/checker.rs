//! Availability checker.
//!
//! Each domain goes through the same steps:
//!
//! ```text
//! PENDING -> cache hit -> DONE (cached status)
//! PENDING -> WHOIS -> available | taken -> DONE
//! PENDING -> WHOIS -> inconclusive | error -> API -> available | taken | unknown -> DONE
//! PENDING -> invalid name -> DONE (error, not cached)
//! ```
//!
//! A domain neither tier can decide, failures included, resolves to
//! `unknown` with the reasons in `error_detail`. Every resolved status is
//! written through to the lookup cache, so a rerun inside the freshness
//! window sends no queries and reports the same statuses.

use crate::error::DomainSweepError;
use crate::lookup_cache::{LookupCache, LookupCacheEntry};
use crate::pool::WorkerPool;
use crate::protocols::{DomainLookup, DomainrClient, WhoisClient};
use crate::report::{Report, ResultAggregator};
use crate::types::{CheckConfig, CheckResult, LookupSource, Status, Verdict};
use crate::utils::{read_domain_file, validate_domain};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the per-domain lookup state machine, alone or over a worker pool.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{AvailabilityChecker, CheckConfig, LookupCache};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = Arc::new(LookupCache::load("output/domain_status.json", 7));
///     let checker = AvailabilityChecker::new(CheckConfig::default(), cache)?;
///     let result = checker.check_domain("ab.us").await;
///     println!("{} is {}", result.domain, result.status);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AvailabilityChecker {
    config: CheckConfig,
    cache: Arc<LookupCache>,
    primary: Arc<dyn DomainLookup>,
    fallback: Option<Arc<dyn DomainLookup>>,
}

impl AvailabilityChecker {
    /// Build a checker with the system WHOIS client and, when API keys are
    /// configured, the Domainr fallback.
    pub fn new(config: CheckConfig, cache: Arc<LookupCache>) -> Result<Self, DomainSweepError> {
        let primary: Arc<dyn DomainLookup> = Arc::new(WhoisClient::with_command(
            config.whois_command.clone(),
            config.check_timeout,
        ));

        let fallback: Option<Arc<dyn DomainLookup>> = if config.has_api_fallback() {
            Some(Arc::new(DomainrClient::new(
                config.api_url.clone(),
                config.api_type,
                config.api_keys.clone(),
                config.check_timeout,
            )?))
        } else {
            info!("No Domainr API keys configured; inconclusive WHOIS results stay unknown");
            None
        };

        Ok(Self::with_lookups(config, cache, primary, fallback))
    }

    /// Build a checker from explicit lookup tiers.
    pub fn with_lookups(
        config: CheckConfig,
        cache: Arc<LookupCache>,
        primary: Arc<dyn DomainLookup>,
        fallback: Option<Arc<dyn DomainLookup>>,
    ) -> Self {
        Self {
            config,
            cache,
            primary,
            fallback,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Check one domain. Never fails: lookup errors end up in the result.
    ///
    /// Internationalized names are checked in their ASCII form. A name that
    /// is not a valid domain is reported as `error` without any lookup.
    pub async fn check_domain(&self, domain: &str) -> CheckResult {
        let domain = match validate_domain(domain) {
            Ok(domain) => domain,
            Err(e) => {
                warn!("{}", e);
                let name = domain.trim().to_lowercase();
                return resolved(
                    &name,
                    Status::Error,
                    self.primary.source(),
                    Some(e.to_string()),
                );
            }
        };

        if let Some(entry) = self.cache.get(&domain) {
            debug!("Cache hit for {}: {}", domain, entry.status);
            return CheckResult {
                domain,
                status: entry.status,
                source: entry.source,
                checked_at: entry.checked_at,
                cached: true,
                error_detail: entry.error_detail,
            };
        }

        let result = self.resolve(&domain).await;
        debug!("{} resolved as {} via {}", domain, result.status, result.source);

        let pending = self.cache.insert_entry(
            &result.domain,
            LookupCacheEntry {
                status: result.status.cacheable(),
                source: result.source,
                checked_at: result.checked_at,
                error_detail: result.error_detail.clone(),
            },
        );
        if self.config.save_interval > 0 && pending >= self.config.save_interval {
            self.save_cache_in_background().await;
        }

        result
    }

    async fn resolve(&self, domain: &str) -> CheckResult {
        let whois_source = self.primary.source();
        let whois_reason = match self.primary.lookup(domain).await {
            Ok(Verdict::Available) => {
                return resolved(domain, Status::Available, whois_source, None)
            }
            Ok(Verdict::Taken) => return resolved(domain, Status::Taken, whois_source, None),
            Ok(Verdict::Inconclusive(reason)) => reason,
            Err(e) => e.to_string(),
        };
        debug!("WHOIS inconclusive for {}: {}", domain, whois_reason);

        let Some(fallback) = &self.fallback else {
            return resolved(
                domain,
                Status::Unknown,
                whois_source,
                Some(format!(
                    "WHOIS inconclusive ({}); no API fallback configured",
                    whois_reason
                )),
            );
        };

        let api_source = fallback.source();
        match fallback.lookup(domain).await {
            Ok(Verdict::Available) => resolved(domain, Status::Available, api_source, None),
            Ok(Verdict::Taken) => resolved(domain, Status::Taken, api_source, None),
            Ok(Verdict::Inconclusive(api_reason)) => resolved(
                domain,
                Status::Unknown,
                api_source,
                Some(format!("WHOIS: {}; API: {}", whois_reason, api_reason)),
            ),
            Err(e) => {
                if matches!(e, DomainSweepError::RateLimited { .. }) {
                    warn!("{} left unresolved until its cache entry expires", domain);
                } else {
                    debug!("API lookup failed for {}: {}", domain, e);
                }
                resolved(
                    domain,
                    Status::Unknown,
                    api_source,
                    Some(format!("WHOIS: {}; API: {}", whois_reason, e)),
                )
            }
        }
    }

    /// Incremental save. The file write runs on the blocking pool, and only
    /// the task that claims the pending writes performs it.
    async fn save_cache_in_background(&self) {
        let cache = Arc::clone(&self.cache);
        let interval = self.config.save_interval;
        match tokio::task::spawn_blocking(move || cache.persist_if_due(interval)).await {
            Ok(Ok(true)) => debug!("Lookup cache saved incrementally"),
            Ok(Ok(false)) => {}
            Ok(Err(e)) => warn!("Incremental lookup cache save failed: {}", e),
            Err(e) => warn!("Incremental lookup cache save task failed: {}", e),
        }
    }

    /// Check many domains over the worker pool.
    ///
    /// Input is lowercased and de-duplicated before dispatch, so no domain
    /// is queried twice in one run. The cache is pruned and persisted at
    /// the end.
    pub async fn check_all<I>(&self, domains: I) -> Result<Report, DomainSweepError>
    where
        I: IntoIterator<Item = String>,
    {
        self.check_all_with_progress(domains, |_| {}).await
    }

    /// `check_all` with a callback invoked once per finished domain.
    pub async fn check_all_with_progress<I, P>(
        &self,
        domains: I,
        mut on_result: P,
    ) -> Result<Report, DomainSweepError>
    where
        I: IntoIterator<Item = String>,
        P: FnMut(&CheckResult),
    {
        let pool = WorkerPool::new(self.config.thread_count);
        let mut seen = HashSet::new();
        let jobs = domains
            .into_iter()
            .map(|d| validate_domain(&d).unwrap_or_else(|_| d.trim().to_lowercase()))
            .filter(|d| !d.is_empty())
            .filter(move |d| seen.insert(d.clone()));

        let checker = self.clone();
        let mut aggregator = ResultAggregator::new();
        let stats = pool
            .run(
                jobs,
                move |domain: String| {
                    let checker = checker.clone();
                    async move { checker.check_domain(&domain).await }
                },
                |result| {
                    on_result(&result);
                    aggregator.record(result);
                },
            )
            .await?;

        let pruned = self.cache.prune_expired();
        if pruned > 0 {
            debug!("Pruned {} expired lookup cache entries", pruned);
        }
        self.cache.persist()?;

        let report = aggregator.finish();
        info!("{} ({} dispatched)", report.summary, stats.dispatched);
        Ok(report)
    }

    /// Check every domain listed in a newline-delimited file.
    pub async fn check_file<P: AsRef<Path>>(&self, path: P) -> Result<Report, DomainSweepError> {
        let domains = read_domain_file(path)?;
        self.check_all(domains).await
    }
}

fn resolved(
    domain: &str,
    status: Status,
    source: LookupSource,
    error_detail: Option<String>,
) -> CheckResult {
    CheckResult {
        domain: domain.to_string(),
        status,
        source,
        checked_at: Utc::now(),
        cached: false,
        error_detail,
    }
}
