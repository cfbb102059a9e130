//! Lookup protocols used to check domain availability.
//!
//! WHOIS is the primary tier and the Domainr API the fallback. Each client
//! splits into network plumbing and a pure classifier that turns the raw
//! response into a [`Verdict`].

use crate::error::DomainSweepError;
use crate::types::{LookupSource, Verdict};
use async_trait::async_trait;

/// Domainr availability API
pub mod domainr;

/// WHOIS protocol implementation
pub mod whois;

pub use domainr::{classify_domainr_response, DomainrClient, DomainrResponse, DEFAULT_DOMAINR_URL};
pub use whois::{
    classify_whois_response, is_whois_available, DefaultWhoisClassifier, WhoisClassifier,
    WhoisClient,
};

/// One availability lookup tier.
///
/// `Ok(Verdict::Inconclusive)` means the tier answered but could not decide;
/// `Err` means the query itself failed (timeout, transport, HTTP error).
#[async_trait]
pub trait DomainLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<Verdict, DomainSweepError>;

    /// Which tier this is, recorded on every result it produces.
    fn source(&self) -> LookupSource;
}
