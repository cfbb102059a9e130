//! Domainr status API, the fallback tier.
//!
//! Only consulted when WHOIS could not decide. Credentials are either
//! RapidAPI keys (sent as headers) or Domainr client ids (sent as the
//! `client_id` query parameter); several keys are rotated round-robin.

use super::DomainLookup;
use crate::error::DomainSweepError;
use crate::types::{ApiType, LookupSource, Verdict};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Domainr v2 status endpoint.
pub const DEFAULT_DOMAINR_URL: &str = "https://api.domainr.com/v2/status";

/// Host header RapidAPI routes on.
pub const RAPIDAPI_HOST: &str = "domainr.p.rapidapi.com";

/// Status tokens that mean somebody holds the name.
const TAKEN_TOKENS: &[&str] = &[
    "active",
    "parked",
    "marketed",
    "claimed",
    "reserved",
    "priced",
    "transferable",
    "expiring",
    "deleting",
    "pending",
    "disallowed",
    "dpml",
];

/// Body of a `/v2/status` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainrResponse {
    #[serde(default)]
    pub status: Vec<DomainrStatus>,
    #[serde(default)]
    pub errors: Vec<DomainrApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainrStatus {
    pub domain: String,
    #[serde(default)]
    pub zone: String,
    /// Space separated status tokens, e.g. "undelegated inactive"
    pub status: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainrApiError {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: String,
}

/// Classify a Domainr status response for `domain`.
///
/// Any registration token wins and means taken. Otherwise `inactive`, or a
/// status that is only `undelegated`, means available. Everything else
/// (`unknown`, `zone`, `tld`, missing entries) is inconclusive.
pub fn classify_domainr_response(domain: &str, response: &DomainrResponse) -> Verdict {
    if let Some(error) = response.errors.first() {
        return Verdict::Inconclusive(format!("API error: {}", error.message));
    }

    let entry = response
        .status
        .iter()
        .find(|s| s.domain.eq_ignore_ascii_case(domain))
        .or_else(|| response.status.first());

    let Some(entry) = entry else {
        return Verdict::Inconclusive("API returned no status".to_string());
    };

    let status = entry.status.to_lowercase();
    let tokens: Vec<&str> = status.split_whitespace().collect();

    if tokens.iter().any(|t| TAKEN_TOKENS.contains(t)) {
        return Verdict::Taken;
    }
    if tokens.contains(&"inactive") || tokens == ["undelegated"] {
        return Verdict::Available;
    }

    Verdict::Inconclusive(format!("unrecognized API status '{}'", entry.status))
}

/// HTTP client for the Domainr status endpoint.
pub struct DomainrClient {
    http_client: reqwest::Client,
    base_url: String,
    api_type: ApiType,
    api_keys: Vec<String>,
    next_key: AtomicUsize,
    timeout: Duration,
}

impl DomainrClient {
    /// Create a client. Blank keys are dropped.
    pub fn new<U: Into<String>>(
        base_url: U,
        api_type: ApiType,
        api_keys: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, DomainSweepError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("domain-sweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DomainSweepError::network_with_source(
                    "Failed to create Domainr HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_type,
            api_keys: api_keys
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            next_key: AtomicUsize::new(0),
            timeout,
        })
    }

    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }

    /// Next key in round-robin order.
    fn rotate_key(&self) -> Option<&str> {
        if self.api_keys.is_empty() {
            return None;
        }
        let index = self.next_key.fetch_add(1, Ordering::Relaxed) % self.api_keys.len();
        Some(&self.api_keys[index])
    }

    /// Fetch the raw status document for `domain`.
    ///
    /// # Errors
    ///
    /// `RateLimited` on HTTP 429, `AuthenticationError` on 401/403,
    /// `ApiError` on other HTTP failures, `Timeout`/`NetworkError` on
    /// transport failures and `ParseError` on an unreadable body.
    pub async fn fetch_status(&self, domain: &str) -> Result<DomainrResponse, DomainSweepError> {
        let key = self
            .rotate_key()
            .ok_or_else(|| DomainSweepError::authentication("domainr", "no API key configured"))?;

        let mut request = self.http_client.get(&self.base_url).query(&[("domain", domain)]);
        request = match self.api_type {
            ApiType::RapidApi => request
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", RAPIDAPI_HOST),
            ApiType::Direct => request.query(&[("client_id", key)]),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DomainSweepError::timeout("Domainr API query", self.timeout)
            } else {
                DomainSweepError::network_with_source(
                    format!("Domainr request for {} failed", domain),
                    e.to_string(),
                )
            }
        })?;

        let status = response.status();
        match status.as_u16() {
            429 => {
                warn!("Domainr rate limit hit for {}", domain);
                return Err(DomainSweepError::rate_limited(
                    "domainr",
                    format!("HTTP 429 for {}", domain),
                ));
            }
            401 | 403 => {
                return Err(DomainSweepError::authentication(
                    "domainr",
                    format!("HTTP {} (check domainr_api_keys)", status.as_u16()),
                ))
            }
            _ if !status.is_success() => {
                return Err(DomainSweepError::api_with_status(
                    domain,
                    format!("unexpected HTTP status {}", status),
                    status.as_u16(),
                ))
            }
            _ => {}
        }

        let body = response.text().await.map_err(|e| {
            DomainSweepError::network_with_source("Failed to read Domainr response", e.to_string())
        })?;
        serde_json::from_str(&body).map_err(|e| DomainSweepError::ParseError {
            message: format!("Invalid Domainr response for {}: {}", domain, e),
            content: Some(body.chars().take(200).collect()),
        })
    }
}

#[async_trait]
impl DomainLookup for DomainrClient {
    async fn lookup(&self, domain: &str) -> Result<Verdict, DomainSweepError> {
        let response = self.fetch_status(domain).await?;
        let verdict = classify_domainr_response(domain, &response);
        debug!("Domainr verdict for {}: {:?}", domain, verdict);
        Ok(verdict)
    }

    fn source(&self) -> LookupSource {
        LookupSource::Api
    }
}
