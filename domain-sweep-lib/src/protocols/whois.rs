//! WHOIS lookups through the system `whois` client.
//!
//! WHOIS responses are unstructured text that differ per registry, so the
//! decision is made by a [`WhoisClassifier`]. The default classifier is a
//! marker-based heuristic: a "no record" marker means available, two or more
//! registration markers mean taken, everything else is inconclusive and goes
//! to the fallback tier.

use super::DomainLookup;
use crate::error::DomainSweepError;
use crate::types::{LookupSource, Verdict};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Turns raw WHOIS text into a verdict.
pub trait WhoisClassifier: Send + Sync {
    fn classify(&self, domain: &str, response: &str) -> Verdict;
}

/// Marker-based classifier, see [`classify_whois_response`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWhoisClassifier;

impl WhoisClassifier for DefaultWhoisClassifier {
    fn classify(&self, _domain: &str, response: &str) -> Verdict {
        classify_whois_response(response)
    }
}

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "try again later",
    "quota exceeded",
    "limit exceeded",
    "throttled",
    "rate-limited",
    "query rate",
];

const UNSUPPORTED_TLD_PATTERNS: &[&str] = &[
    "no whois server is known",
    "no whois server",
    "invalid tld",
    "unknown tld",
    "tld not found",
    "no such tld",
    "invalid domain extension",
];

const AVAILABLE_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "domain available",
    "status: available",
    "status: free",
    "not registered",
    "no matching record",
    "domain status: no object found",
    "the queried object does not exist",
    "object does not exist",
    "no matching entry",
    "domain name not found",
    "this domain name has not been registered",
];

const TAKEN_PATTERNS: &[&str] = &[
    "domain status:",
    "registrar:",
    "creation date:",
    "created:",
    "registry domain id:",
    "registrant:",
    "registrant name:",
    "admin contact:",
    "tech contact:",
    "name server:",
    "nameservers:",
    "expiry date:",
    "registry expiry date:",
    "expires:",
];

/// Classify a WHOIS response.
///
/// Order matters: empty output, rate-limit notices and unsupported-TLD
/// errors are inconclusive before any availability marker is considered,
/// since those notices often contain "not found" themselves.
pub fn classify_whois_response(response: &str) -> Verdict {
    let text = response.to_lowercase();

    if text.trim().is_empty() {
        return Verdict::Inconclusive("empty WHOIS response".to_string());
    }

    if RATE_LIMIT_PATTERNS.iter().any(|p| text.contains(p)) {
        return Verdict::Inconclusive("WHOIS server rate limited the query".to_string());
    }

    if UNSUPPORTED_TLD_PATTERNS.iter().any(|p| text.contains(p)) {
        return Verdict::Inconclusive("no WHOIS server for this TLD".to_string());
    }

    if AVAILABLE_PATTERNS.iter().any(|p| text.contains(p)) {
        return Verdict::Available;
    }

    let taken_markers = TAKEN_PATTERNS.iter().filter(|p| text.contains(*p)).count();
    if taken_markers >= 2 {
        return Verdict::Taken;
    }

    Verdict::Inconclusive("unrecognized WHOIS response".to_string())
}

/// Runs the system WHOIS client for each lookup.
#[derive(Clone)]
pub struct WhoisClient {
    command: String,
    timeout: Duration,
    classifier: Arc<dyn WhoisClassifier>,
}

impl WhoisClient {
    /// Create a client for the `whois` binary with a 10 second timeout.
    pub fn new() -> Self {
        Self::with_command("whois", Duration::from_secs(10))
    }

    /// Create a client for a specific binary and timeout.
    pub fn with_command<C: Into<String>>(command: C, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
            classifier: Arc::new(DefaultWhoisClassifier),
        }
    }

    /// Swap in a different classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn WhoisClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the WHOIS query and return its raw output.
    ///
    /// The child process is killed if the timeout fires first.
    ///
    /// # Errors
    ///
    /// `Timeout` when the query outlives the timeout, `WhoisError` when the
    /// command cannot be started.
    pub async fn query(&self, domain: &str) -> Result<String, DomainSweepError> {
        let mut command = Command::new(&self.command);
        command.arg(domain).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DomainSweepError::whois(
                    domain,
                    format!(
                        "Failed to execute {}: {}. Make sure 'whois' is installed.",
                        self.command, e
                    ),
                ))
            }
            Err(_) => return Err(DomainSweepError::timeout("WHOIS query", self.timeout)),
        };

        // whois exits non-zero for some "no match" answers, so the exit code
        // is ignored as long as there is output to classify.
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainSweepError::whois(
                domain,
                format!("whois exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(stdout)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DomainLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<Verdict, DomainSweepError> {
        let response = self.query(domain).await?;
        let verdict = self.classifier.classify(domain, &response);
        debug!("WHOIS verdict for {}: {:?}", domain, verdict);
        Ok(verdict)
    }

    fn source(&self) -> LookupSource {
        LookupSource::Whois
    }
}

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the given WHOIS binary can be started at all.
///
/// Runs `<command> --version`. A binary that starts but does not exit in
/// time counts as present and is killed.
pub async fn is_whois_available(command: &str) -> bool {
    starts_within(command, VERSION_CHECK_TIMEOUT).await
}

async fn starts_within(command: &str, limit: Duration) -> bool {
    let run = Command::new(command)
        .arg("--version")
        .kill_on_drop(true)
        .output();
    match tokio::time::timeout(limit, run).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => e.kind() != std::io::ErrorKind::NotFound,
        Err(_) => {
            debug!("'{} --version' did not exit within {:?}", command, limit);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_markers() {
        assert_eq!(
            classify_whois_response("No match for \"XY.IO\".\n>>> Last update of WHOIS database"),
            Verdict::Available
        );
        assert_eq!(
            classify_whois_response("Domain not found."),
            Verdict::Available
        );
        assert_eq!(
            classify_whois_response("The queried object does not exist: DOMAIN NOT FOUND"),
            Verdict::Available
        );
    }

    #[test]
    fn test_taken_needs_two_markers() {
        let taken = "Domain Name: AB.US\nRegistry Domain ID: D123-US\nRegistrar: Example Registrar\nCreation Date: 2002-04-18T15:16:22Z";
        assert_eq!(classify_whois_response(taken), Verdict::Taken);

        let single = "Registrar: Example Registrar\nsome unrelated text";
        assert!(matches!(
            classify_whois_response(single),
            Verdict::Inconclusive(_)
        ));
    }

    #[test]
    fn test_inconclusive_responses() {
        assert!(matches!(classify_whois_response(""), Verdict::Inconclusive(_)));
        assert!(matches!(
            classify_whois_response("   \n"),
            Verdict::Inconclusive(_)
        ));
        assert!(matches!(
            classify_whois_response("Rate limit exceeded. Try again later. Domain not found"),
            Verdict::Inconclusive(_)
        ));
        assert!(matches!(
            classify_whois_response("No whois server is known for this kind of object."),
            Verdict::Inconclusive(_)
        ));
    }

    #[test]
    fn test_custom_classifier() {
        struct AlwaysTaken;
        impl WhoisClassifier for AlwaysTaken {
            fn classify(&self, _domain: &str, _response: &str) -> Verdict {
                Verdict::Taken
            }
        }

        let client = WhoisClient::new().with_classifier(Arc::new(AlwaysTaken));
        assert_eq!(client.classifier.classify("ab.us", "No match"), Verdict::Taken);
    }

    #[test]
    fn test_client_configuration() {
        let client = WhoisClient::with_command("jwhois", Duration::from_secs(3));
        assert_eq!(client.timeout(), Duration::from_secs(3));
        assert_eq!(client.source(), LookupSource::Whois);
    }

    #[tokio::test]
    async fn test_missing_binary_is_whois_error() {
        let client =
            WhoisClient::with_command("definitely-not-a-whois-binary", Duration::from_secs(2));
        let err = client.query("ab.us").await.unwrap_err();
        assert!(matches!(err, DomainSweepError::WhoisError { .. }));
        assert!(!is_whois_available("definitely-not-a-whois-binary").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_query_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-whois");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\necho 'No match'\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let client = WhoisClient::with_command(
            script.to_string_lossy().to_string(),
            Duration::from_millis(200),
        );
        let err = client.lookup("xy.io").await.unwrap_err();
        assert!(matches!(err, DomainSweepError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hanging_version_check_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hanging-whois");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let started = std::time::Instant::now();
        assert!(starts_within(&script.to_string_lossy(), Duration::from_millis(200)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
