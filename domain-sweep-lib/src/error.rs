//! Error handling for domain sweeping operations.
//!
//! Errors fall in two groups. Fatal errors (`ConfigError`, `SourceUnavailable`,
//! file problems) abort a run before any lookup. Per-domain lookup errors
//! (`Timeout`, `WhoisError`, `ApiError`, `RateLimited`, ...) are recovered by
//! the checker and only ever show up in the report's status field.

use std::fmt;
use std::time::Duration;

/// Main error type for domain sweeping operations.
#[derive(Debug, Clone)]
pub enum DomainSweepError {
    /// Invalid domain name format
    InvalidDomain { domain: String, reason: String },

    /// Configuration errors (invalid or missing settings)
    ConfigError { message: String },

    /// A required data source (TLD list, reserved list) is unreachable
    /// and no usable cached copy exists
    SourceUnavailable { source: String, message: String },

    /// Network-related errors (connection refused, DNS failure, ...)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// WHOIS protocol specific errors
    WhoisError { domain: String, message: String },

    /// Domainr API errors (unexpected status, malformed body)
    ApiError {
        domain: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The API rejected the configured credentials
    AuthenticationError { service: String, message: String },

    /// JSON/TOML parsing errors
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// File I/O errors for state files, domain lists and reports
    FileError { path: String, message: String },

    /// Timeout errors when a lookup takes too long
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Rate limiting signalled by WHOIS output or HTTP 429
    RateLimited { service: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DomainSweepError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new source-unavailable error.
    pub fn source_unavailable<S: Into<String>, M: Into<String>>(source: S, message: M) -> Self {
        Self::SourceUnavailable {
            source: source.into(),
            message: message.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new WHOIS error.
    pub fn whois<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::WhoisError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new API error.
    pub fn api<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::ApiError {
            domain: domain.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new API error with HTTP status code.
    pub fn api_with_status<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::ApiError {
            domain: domain.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new authentication error.
    pub fn authentication<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::AuthenticationError {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new rate-limited error.
    pub fn rate_limited<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::RateLimited {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error must abort the run.
    ///
    /// Lookup failures are never fatal: they resolve to `unknown`/`error`
    /// for the affected domain and the run continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. }
                | Self::SourceUnavailable { .. }
                | Self::FileError { .. }
                | Self::Internal { .. }
        )
    }

    /// Whether this error is a per-domain lookup failure.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. }
                | Self::WhoisError { .. }
                | Self::ApiError { .. }
                | Self::AuthenticationError { .. }
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
        )
    }

    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError { .. } => 2,
            Self::SourceUnavailable { .. } => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for DomainSweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::SourceUnavailable { source, message } => {
                write!(f, "Source unavailable ({}): {}", source, message)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::WhoisError { domain, message } => {
                write!(f, "WHOIS error for '{}': {}", domain, message)
            }
            Self::ApiError {
                domain,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error for '{}' (HTTP {}): {}", domain, code, message)
                } else {
                    write!(f, "API error for '{}': {}", domain, message)
                }
            }
            Self::AuthenticationError { service, message } => {
                write!(f, "Authentication failed for {}: {}", service, message)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::RateLimited { service, message } => {
                write!(f, "Rate limited by {}: {}", service, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DomainSweepError {}

impl From<reqwest::Error> for DomainSweepError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", Duration::from_secs(0))
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for DomainSweepError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<toml::de::Error> for DomainSweepError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<std::io::Error> for DomainSweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<regex::Error> for DomainSweepError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}
