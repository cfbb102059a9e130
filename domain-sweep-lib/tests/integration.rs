//! Integration tests for domain-sweep-lib: generation through checking,
//! with scripted lookup tiers in place of WHOIS and Domainr.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use domain_sweep_lib::{
    AvailabilityChecker, CheckConfig, DomainGenerator, DomainLookup, DomainSweepError,
    GenerateConfig, LookupCache, LookupSource, Report, ReservedSet, Status, TldCache,
    TldSource, Verdict,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lookup tier answering from a fixed table, counting every query.
struct TableLookup {
    source: LookupSource,
    answers: HashMap<&'static str, Result<Verdict, DomainSweepError>>,
    calls: AtomicUsize,
}

impl TableLookup {
    fn new(
        source: LookupSource,
        answers: Vec<(&'static str, Result<Verdict, DomainSweepError>)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            answers: answers.into_iter().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DomainLookup for TableLookup {
    async fn lookup(&self, domain: &str) -> Result<Verdict, DomainSweepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(domain)
            .cloned()
            .unwrap_or_else(|| Ok(Verdict::Inconclusive("no answer scripted".into())))
    }

    fn source(&self) -> LookupSource {
        self.source
    }
}

struct FailingTldSource;

#[async_trait]
impl TldSource for FailingTldSource {
    async fn fetch(&self) -> Result<Vec<String>, DomainSweepError> {
        Err(DomainSweepError::network("connection refused"))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

fn checker_with(
    cache: Arc<LookupCache>,
    whois: &Arc<TableLookup>,
    api: Option<&Arc<TableLookup>>,
) -> AvailabilityChecker {
    AvailabilityChecker::with_lookups(
        CheckConfig::default().with_thread_count(4),
        cache,
        whois.clone(),
        api.map(|a| a.clone() as Arc<dyn DomainLookup>),
    )
}

fn domains(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn write_cache_file(path: &Path, domain: &str, status: &str, age: ChronoDuration) {
    let checked_at = (Utc::now() - age).to_rfc3339();
    let content = format!(
        r#"{{"{}": {{"status": "{}", "source": "whois", "checked_at": "{}"}}}}"#,
        domain, status, checked_at
    );
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_library_info() {
    let info = domain_sweep_lib::info();
    assert_eq!(info.version, domain_sweep_lib::VERSION);
    assert!(info.features.contains(&"whois"));
    assert!(info.features.contains(&"domainr"));
}

#[test]
fn test_prefix_generation_yields_single_candidate() {
    let config = GenerateConfig::default()
        .with_sld_lengths(2, 2)
        .with_prefix_domain("ab")
        .with_prefix_tld("us");
    let generator = DomainGenerator::new(
        config,
        domains(&["com", "us", "uk", "io"]),
        ReservedSet::default(),
    )
    .unwrap();

    let candidates: Vec<String> = generator.candidates().map(|c| c.full).collect();
    assert_eq!(candidates, vec!["ab.us"]);
}

#[test]
fn test_reserved_and_registry_minimums_filter_pairs() {
    let config = GenerateConfig::default().with_prefix_domain("ab");
    let reserved = ReservedSet::new(["ab.io"]);
    let mut config_with_minimum = config.clone();
    config_with_minimum
        .tld_min_sld_length
        .insert("us".to_string(), 3);

    let generator =
        DomainGenerator::new(config_with_minimum, domains(&["us", "io", "de"]), reserved)
            .unwrap();
    let candidates: Vec<String> = generator.candidates().map(|c| c.full).collect();
    assert_eq!(candidates, vec!["ab.de"]);
}

#[tokio::test]
async fn test_inconclusive_whois_queries_api_exactly_once() {
    let whois = TableLookup::new(
        LookupSource::Whois,
        vec![("xy.io", Ok(Verdict::Inconclusive("empty response".into())))],
    );
    let api = TableLookup::new(LookupSource::Api, vec![("xy.io", Ok(Verdict::Taken))]);
    let checker = checker_with(Arc::new(LookupCache::in_memory(7)), &whois, Some(&api));

    let report = checker.check_all(domains(&["xy.io"])).await.unwrap();
    let entry = report.get("xy.io").unwrap();
    assert_eq!(entry.status, Status::Taken);
    assert_eq!(entry.source, LookupSource::Api);
    assert_eq!(whois.calls(), 1);
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_whois_timeout_falls_back_to_api() {
    let whois = TableLookup::new(
        LookupSource::Whois,
        vec![(
            "xy.io",
            Err(DomainSweepError::timeout("WHOIS query", Duration::from_secs(10))),
        )],
    );
    let api = TableLookup::new(LookupSource::Api, vec![("xy.io", Ok(Verdict::Available))]);
    let checker = checker_with(Arc::new(LookupCache::in_memory(7)), &whois, Some(&api));

    let result = checker.check_domain("xy.io").await;
    assert_eq!(result.status, Status::Available);
    assert_eq!(result.source, LookupSource::Api);
    assert!(!result.cached);
}

#[tokio::test]
async fn test_fresh_cache_entry_skips_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domain_status.json");
    write_cache_file(&path, "ab.us", "taken", ChronoDuration::days(1));

    let whois = TableLookup::new(LookupSource::Whois, vec![("ab.us", Ok(Verdict::Available))]);
    let checker = checker_with(Arc::new(LookupCache::load(&path, 7)), &whois, None);

    let result = checker.check_domain("ab.us").await;
    assert_eq!(result.status, Status::Taken);
    assert!(result.cached);
    assert_eq!(whois.calls(), 0);
}

#[tokio::test]
async fn test_expired_cache_entry_is_checked_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domain_status.json");
    write_cache_file(&path, "ab.us", "taken", ChronoDuration::days(8));

    let whois = TableLookup::new(LookupSource::Whois, vec![("ab.us", Ok(Verdict::Available))]);
    let checker = checker_with(Arc::new(LookupCache::load(&path, 7)), &whois, None);

    let result = checker.check_domain("ab.us").await;
    assert_eq!(result.status, Status::Available);
    assert!(!result.cached);
    assert_eq!(whois.calls(), 1);
}

#[tokio::test]
async fn test_rerun_is_served_from_cache_with_identical_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output/domain_status.json");
    let input = domains(&["ab.us", "cd.de", "xy.io", "zz.io"]);
    let answers = || {
        vec![
            ("ab.us", Ok(Verdict::Taken)),
            ("cd.de", Ok(Verdict::Available)),
            ("xy.io", Ok(Verdict::Inconclusive("rate limit exceeded".into()))),
            ("zz.io", Err(DomainSweepError::whois("zz.io", "no output"))),
        ]
    };

    let first_whois = TableLookup::new(LookupSource::Whois, answers());
    let first = checker_with(Arc::new(LookupCache::load(&path, 7)), &first_whois, None)
        .check_all(input.clone())
        .await
        .unwrap();
    assert_eq!(first_whois.calls(), 4);
    assert!(path.exists());

    let second_whois = TableLookup::new(LookupSource::Whois, answers());
    let second = checker_with(Arc::new(LookupCache::load(&path, 7)), &second_whois, None)
        .check_all(input)
        .await
        .unwrap();

    assert_eq!(second_whois.calls(), 0);
    assert_eq!(second.summary.cached, 4);
    assert_eq!(
        serde_json::to_string_pretty(&first).unwrap(),
        serde_json::to_string_pretty(&second).unwrap()
    );
}

/// One check run where WHOIS times out on xy.io and the API then fails.
async fn run_with_failing_fallback(path: &Path) -> (Report, usize) {
    let whois = TableLookup::new(
        LookupSource::Whois,
        vec![
            ("ab.us", Ok(Verdict::Taken)),
            (
                "xy.io",
                Err(DomainSweepError::timeout("WHOIS query", Duration::from_secs(10))),
            ),
        ],
    );
    let api = TableLookup::new(
        LookupSource::Api,
        vec![("xy.io", Err(DomainSweepError::api("domainr", "HTTP 503")))],
    );
    let report = checker_with(Arc::new(LookupCache::load(path, 7)), &whois, Some(&api))
        .check_all(domains(&["ab.us", "xy.io"]))
        .await
        .unwrap();
    (report, api.calls())
}

#[tokio::test]
async fn test_rerun_with_failing_fallback_reports_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domain_status.json");

    let (first, first_api_calls) = run_with_failing_fallback(&path).await;
    assert_eq!(first_api_calls, 1);
    assert_eq!(first.get("xy.io").unwrap().status, Status::Unknown);
    assert_eq!(first.summary.unknown, 1);
    assert_eq!(first.summary.error, 0);

    let (second, second_api_calls) = run_with_failing_fallback(&path).await;
    assert_eq!(second_api_calls, 0);
    assert_eq!(second.summary.cached, 2);
    assert_eq!(
        serde_json::to_string_pretty(&first).unwrap(),
        serde_json::to_string_pretty(&second).unwrap()
    );
}

#[tokio::test]
async fn test_generated_candidates_flow_into_checker() {
    let generator = DomainGenerator::new(
        GenerateConfig::default().with_prefix_domain("a"),
        domains(&["us"]),
        ReservedSet::default(),
    )
    .unwrap();

    let whois = TableLookup::new(
        LookupSource::Whois,
        vec![("ab.us", Ok(Verdict::Available)), ("ax.us", Ok(Verdict::Available))],
    );
    let api = TableLookup::new(LookupSource::Api, vec![]);
    let checker = checker_with(Arc::new(LookupCache::in_memory(7)), &whois, Some(&api));

    let report = checker
        .check_all(generator.candidates().map(|c| c.full))
        .await
        .unwrap();

    assert_eq!(report.len(), 26);
    assert_eq!(report.available_domains(), vec!["ab.us", "ax.us"]);
    assert_eq!(report.summary.unknown, 24);
    assert_eq!(whois.calls(), 26);
    assert_eq!(api.calls(), 24);
}

#[test]
fn test_stale_tld_cache_survives_offline_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tld_list.json");

    let mut cache = TldCache::new(&path, 7);
    cache.set(
        vec!["com".to_string(), "us".to_string()],
        Utc::now() - ChronoDuration::days(30),
    );
    cache.persist().unwrap();

    let mut reloaded = TldCache::load(&path, 7);
    assert!(reloaded.is_stale());

    let tlds = tokio_test::block_on(reloaded.get_valid_tlds(&FailingTldSource)).unwrap();
    assert_eq!(tlds, vec!["com".to_string(), "us".to_string()]);
}

#[test]
fn test_missing_tld_cache_and_offline_source_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = TldCache::load(dir.path().join("tld_list.json"), 7);

    let err = tokio_test::block_on(cache.get_valid_tlds(&FailingTldSource)).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
