//! Configuration file parsing and management.
//!
//! Configuration comes from TOML files (or a JSON `config.json`), `DS_*`
//! environment variables and CLI flags. Files are merged in precedence
//! order and the result is validated into [`Settings`].
//!
//! Keys are flat, matching `config.json`:
//!
//! ```toml
//! min_sld_length = 2
//! min_tld_length = 2
//! max_cache_age_days = 7
//! thread_count = 10
//! check_timeout = 10
//! domainr_api_type = "rapidapi"
//! domainr_api_keys = "${DOMAINR_KEYS}"
//! ```
//!
//! Any string value written exactly as `${VAR}` is replaced with the
//! environment variable `VAR` when it is set.

use crate::error::DomainSweepError;
use crate::protocols::domainr::DEFAULT_DOMAINR_URL;
use crate::tld_cache::DEFAULT_TLD_SOURCE_URL;
use crate::types::{ApiType, CheckConfig, GenerateConfig, StatePaths};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw configuration as read from one source. Every field is optional so
/// sources can be layered; unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_sld_length: Option<usize>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_sld_length: Option<usize>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_tld_length: Option<usize>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub target_word_length: Option<usize>,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub only_words: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_tld: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld_min_sld_length: Option<HashMap<String, usize>>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_cache_age_days: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub thread_count: Option<usize>,
    /// Seconds, or a duration string like "10s" / "1m"
    #[serde(default, deserialize_with = "lenient_timeout", skip_serializing_if = "Option::is_none")]
    pub check_timeout: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub save_interval: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domainr_api_type: Option<String>,
    /// Comma separated string or a list
    #[serde(default, deserialize_with = "key_list", skip_serializing_if = "Option::is_none")]
    pub domainr_api_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domainr_api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld_source_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld_cache_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_cache_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_list_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_domains_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_file: Option<PathBuf>,

    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub enable_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub smtp_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub enable_webhook: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl FileConfig {
    /// Layer `higher` over `self`; any value set in `higher` wins.
    pub fn merge(self, higher: FileConfig) -> FileConfig {
        FileConfig {
            min_sld_length: higher.min_sld_length.or(self.min_sld_length),
            max_sld_length: higher.max_sld_length.or(self.max_sld_length),
            min_tld_length: higher.min_tld_length.or(self.min_tld_length),
            target_word_length: higher.target_word_length.or(self.target_word_length),
            only_words: higher.only_words.or(self.only_words),
            prefix_domain: higher.prefix_domain.or(self.prefix_domain),
            prefix_tld: higher.prefix_tld.or(self.prefix_tld),
            tld_min_sld_length: match (self.tld_min_sld_length, higher.tld_min_sld_length) {
                (Some(mut lower), Some(higher)) => {
                    lower.extend(higher);
                    Some(lower)
                }
                (lower, higher) => higher.or(lower),
            },
            max_cache_age_days: higher.max_cache_age_days.or(self.max_cache_age_days),
            thread_count: higher.thread_count.or(self.thread_count),
            check_timeout: higher.check_timeout.or(self.check_timeout),
            save_interval: higher.save_interval.or(self.save_interval),
            whois_command: higher.whois_command.or(self.whois_command),
            domainr_api_type: higher.domainr_api_type.or(self.domainr_api_type),
            domainr_api_keys: higher.domainr_api_keys.or(self.domainr_api_keys),
            domainr_api_url: higher.domainr_api_url.or(self.domainr_api_url),
            tld_source_url: higher.tld_source_url.or(self.tld_source_url),
            tld_cache_file: higher.tld_cache_file.or(self.tld_cache_file),
            lookup_cache_file: higher.lookup_cache_file.or(self.lookup_cache_file),
            reserved_file: higher.reserved_file.or(self.reserved_file),
            word_list_file: higher.word_list_file.or(self.word_list_file),
            generated_domains_file: higher
                .generated_domains_file
                .or(self.generated_domains_file),
            results_file: higher.results_file.or(self.results_file),
            available_file: higher.available_file.or(self.available_file),
            enable_email: higher.enable_email.or(self.enable_email),
            smtp_host: higher.smtp_host.or(self.smtp_host),
            smtp_port: higher.smtp_port.or(self.smtp_port),
            smtp_user: higher.smtp_user.or(self.smtp_user),
            smtp_pass: higher.smtp_pass.or(self.smtp_pass),
            email_to: higher.email_to.or(self.email_to),
            enable_webhook: higher.enable_webhook.or(self.enable_webhook),
            webhook_url: higher.webhook_url.or(self.webhook_url),
        }
    }
}

/// Notification settings. Accepted for compatibility with existing
/// configuration files; nothing is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSettings {
    pub enable_email: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub email_to: String,
    pub enable_webhook: bool,
    pub webhook_url: String,
}

impl NotificationSettings {
    pub fn any_enabled(&self) -> bool {
        self.enable_email || self.enable_webhook
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub check: CheckConfig,
    pub generate: GenerateConfig,
    pub paths: StatePaths,
    pub tld_source_url: String,
    pub notifications: NotificationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check: CheckConfig::default(),
            generate: GenerateConfig::default(),
            paths: StatePaths::default(),
            tld_source_url: DEFAULT_TLD_SOURCE_URL.to_string(),
            notifications: NotificationSettings {
                smtp_port: 465,
                ..Default::default()
            },
        }
    }
}

impl Settings {
    /// Apply a merged `FileConfig` over the defaults and validate it.
    pub fn from_file_config(config: FileConfig) -> Result<Self, DomainSweepError> {
        validate_config(&config)?;

        let mut settings = Settings::default();

        let generate = &mut settings.generate;
        if let Some(min) = config.min_sld_length {
            generate.min_sld_length = min;
        }
        generate.max_sld_length = config
            .max_sld_length
            .unwrap_or(generate.min_sld_length)
            .max(generate.min_sld_length);
        if let Some(min) = config.min_tld_length {
            generate.min_tld_length = min;
        }
        if let Some(len) = config.target_word_length {
            generate.target_word_length = len;
        }
        if let Some(only_words) = config.only_words {
            generate.only_words = only_words;
        }
        if let Some(prefix) = config.prefix_domain {
            *generate = std::mem::take(generate).with_prefix_domain(prefix);
        }
        if let Some(prefix) = config.prefix_tld {
            *generate = std::mem::take(generate).with_prefix_tld(prefix);
        }
        if let Some(minimums) = config.tld_min_sld_length {
            generate.tld_min_sld_length = minimums
                .into_iter()
                .map(|(tld, min)| (tld.to_lowercase(), min))
                .collect();
        }

        let check = &mut settings.check;
        if let Some(threads) = config.thread_count {
            check.thread_count = threads;
        }
        if let Some(secs) = config.check_timeout {
            check.check_timeout = Duration::from_secs(secs);
        }
        if let Some(days) = config.max_cache_age_days {
            check.max_cache_age_days = days;
        }
        if let Some(interval) = config.save_interval {
            check.save_interval = interval;
        }
        if let Some(command) = config.whois_command {
            check.whois_command = command;
        }
        if let Some(api_type) = &config.domainr_api_type {
            check.api_type = ApiType::from_str(api_type).map_err(DomainSweepError::config)?;
        }
        if let Some(keys) = config.domainr_api_keys {
            check.api_keys = keys;
        }
        check.api_url = config
            .domainr_api_url
            .unwrap_or_else(|| DEFAULT_DOMAINR_URL.to_string());

        if let Some(url) = config.tld_source_url {
            settings.tld_source_url = url;
        }

        let paths = &mut settings.paths;
        macro_rules! set_path {
            ($field:ident) => {
                if let Some(path) = config.$field {
                    paths.$field = path;
                }
            };
        }
        set_path!(tld_cache_file);
        set_path!(lookup_cache_file);
        set_path!(reserved_file);
        set_path!(generated_domains_file);
        set_path!(results_file);
        set_path!(available_file);
        paths.word_list_file = config.word_list_file;

        let notifications = &mut settings.notifications;
        notifications.enable_email = config.enable_email.unwrap_or(false);
        notifications.smtp_host = config.smtp_host.unwrap_or_default();
        notifications.smtp_port = config.smtp_port.unwrap_or(465);
        notifications.smtp_user = config.smtp_user.unwrap_or_default();
        notifications.smtp_pass = config.smtp_pass.unwrap_or_default();
        notifications.email_to = config.email_to.unwrap_or_default();
        notifications.enable_webhook = config.enable_webhook.unwrap_or(false);
        notifications.webhook_url = config.webhook_url.unwrap_or_default();

        Ok(settings)
    }
}

/// Configuration discovery and loading.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load one configuration file. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainSweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainSweepError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainSweepError::config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let raw: serde_json::Value = if is_json {
            serde_json::from_str(&content).map_err(|e| {
                DomainSweepError::config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            let value: toml::Value = toml::from_str(&content)?;
            serde_json::to_value(value).map_err(|e| DomainSweepError::config(e.to_string()))?
        };

        let config: FileConfig = serde_json::from_value(resolve_env_vars(raw)).map_err(|e| {
            DomainSweepError::config(format!("Invalid configuration in {}: {}", path.display(), e))
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Discover and merge configuration files, lowest precedence first:
    /// XDG, global, local.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainSweepError> {
        let mut merged = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];
        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            if self.verbose {
                debug!("Loaded configuration from {}", path.display());
            }
            merged = merged.merge(config);
        }

        Ok(merged)
    }

    /// Build validated settings from files and environment.
    ///
    /// `explicit` (the `--config` flag) or `DS_CONFIG` replaces file
    /// discovery; `DS_*` variables are layered on top.
    pub fn load_settings(&self, explicit: Option<&Path>) -> Result<Settings, DomainSweepError> {
        let env_config = load_env_config(self.verbose);

        let file_config = match explicit.map(Path::to_path_buf).or(env_config.config) {
            Some(path) => self.load_file(path)?,
            None => self.discover_and_load()?,
        };

        Settings::from_file_config(file_config.merge(env_config.values))
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-sweep.toml", "./.domain-sweep.toml", "./config.json"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|name| Path::new(&home).join(name))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }
}

fn validate_config(config: &FileConfig) -> Result<(), DomainSweepError> {
    for (name, value) in [
        ("min_sld_length", config.min_sld_length),
        ("max_sld_length", config.max_sld_length),
        ("min_tld_length", config.min_tld_length),
        ("target_word_length", config.target_word_length),
    ] {
        if value == Some(0) {
            return Err(DomainSweepError::config(format!("{} must be at least 1", name)));
        }
    }

    if let Some(threads) = config.thread_count {
        if threads == 0 || threads > 100 {
            return Err(DomainSweepError::config(
                "thread_count must be between 1 and 100",
            ));
        }
    }

    if config.check_timeout == Some(0) {
        return Err(DomainSweepError::config(
            "check_timeout must be at least 1 second",
        ));
    }

    if let Some(api_type) = &config.domainr_api_type {
        ApiType::from_str(api_type).map_err(DomainSweepError::config)?;
    }

    if let Some(minimums) = &config.tld_min_sld_length {
        if let Some((tld, _)) = minimums.iter().find(|(_, min)| **min == 0) {
            return Err(DomainSweepError::config(format!(
                "tld_min_sld_length for '{}' must be at least 1",
                tld
            )));
        }
    }

    Ok(())
}

/// Replace `"${VAR}"` strings anywhere in the document.
fn resolve_env_vars(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::String(s) => Value::String(resolve_placeholder(&s, |var| env::var(var).ok())),
        Value::Array(items) => Value::Array(items.into_iter().map(resolve_env_vars).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, resolve_env_vars(v)))
                .collect(),
        ),
        other => other,
    }
}

fn resolve_placeholder<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Some(var) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return value.to_string();
    };

    match lookup(var) {
        Some(resolved) => resolved,
        None => {
            warn!("Environment variable {} is not set; keeping '{}'", var, value);
            value.to_string()
        }
    }
}

/// Values read from `DS_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// `DS_CONFIG`: explicit configuration file
    pub config: Option<PathBuf>,
    /// Everything else, as an overlay for the file configuration
    pub values: FileConfig,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(verbose, |key| env::var(key).ok())
}

/// Load `DS_*` configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(verbose: bool, lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();
    let get = |key: &str| {
        let value = lookup(key).filter(|v| !v.trim().is_empty());
        if verbose {
            if let Some(v) = &value {
                if key.contains("KEYS") {
                    debug!("Using {}=<redacted>", key);
                } else {
                    debug!("Using {}={}", key, v);
                }
            }
        }
        value
    };

    env_config.config = get("DS_CONFIG").map(PathBuf::from);

    let values = &mut env_config.values;
    values.thread_count = parse_env(get("DS_THREAD_COUNT"), "DS_THREAD_COUNT")
        .filter(|n: &usize| (1..=100).contains(n));
    values.check_timeout = get("DS_CHECK_TIMEOUT").and_then(|v| {
        let parsed = parse_timeout_string(&v).filter(|secs| *secs > 0);
        if parsed.is_none() {
            warn!("Invalid DS_CHECK_TIMEOUT='{}', use seconds or '10s'/'1m'", v);
        }
        parsed
    });
    values.max_cache_age_days = parse_env(get("DS_MAX_CACHE_AGE_DAYS"), "DS_MAX_CACHE_AGE_DAYS");
    values.min_sld_length =
        parse_env(get("DS_MIN_SLD_LENGTH"), "DS_MIN_SLD_LENGTH").filter(|n: &usize| *n > 0);
    values.min_tld_length =
        parse_env(get("DS_MIN_TLD_LENGTH"), "DS_MIN_TLD_LENGTH").filter(|n: &usize| *n > 0);
    values.domainr_api_type = get("DS_DOMAINR_API_TYPE").and_then(|v| {
        match ApiType::from_str(&v) {
            Ok(_) => Some(v),
            Err(e) => {
                warn!("Ignoring DS_DOMAINR_API_TYPE: {}", e);
                None
            }
        }
    });
    values.domainr_api_keys = get("DS_DOMAINR_API_KEYS").map(|v| split_keys(&v));

    env_config
}

fn parse_env<T: FromStr>(value: Option<String>, name: &str) -> Option<T> {
    let value = value?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Invalid {}='{}', ignoring", name, value);
            None
        }
    }
}

fn split_keys(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Parse "5", "5s" or "2m" into seconds.
fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(seconds) = timeout_str.strip_suffix('s') {
        seconds.trim().parse().ok()
    } else if let Some(minutes) = timeout_str.strip_suffix('m') {
        minutes.trim().parse::<u64>().ok().map(|m| m * 60)
    } else {
        timeout_str.parse().ok()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + FromStr,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => T::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{} is out of range", n))),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{}' is not a number", s))),
    }
}

fn lenient_timeout<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) => parse_timeout_string(&s).map(Some).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid timeout '{}', use seconds or a value like '10s' or '1m'",
                s
            ))
        }),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrText {
        Bool(bool),
        Text(String),
    }

    match Option::<BoolOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrText::Bool(b)) => Ok(Some(b)),
        Some(BoolOrText::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" | "" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("'{}' is not a boolean", s))),
        },
    }
}

fn key_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keys {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Keys>::deserialize(deserializer)? {
        None => None,
        Some(Keys::Joined(s)) => Some(split_keys(&s)),
        Some(Keys::List(list)) => Some(list.iter().flat_map(|k| split_keys(k)).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("10"), Some(10));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_load_toml_config() {
        let file = write_config(
            ".toml",
            r#"
min_sld_length = 2
max_sld_length = 3
thread_count = 25
check_timeout = "15s"
domainr_api_type = "direct"
domainr_api_keys = "one, two"
results_file = "out/results.json"
unknown_key = "ignored"

[tld_min_sld_length]
us = 3
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(file.path()).unwrap();
        assert_eq!(config.thread_count, Some(25));
        assert_eq!(config.check_timeout, Some(15));
        assert_eq!(
            config.domainr_api_keys,
            Some(vec!["one".to_string(), "two".to_string()])
        );

        let settings = Settings::from_file_config(config).unwrap();
        assert_eq!(settings.generate.max_sld_length, 3);
        assert_eq!(settings.check.thread_count, 25);
        assert_eq!(settings.check.check_timeout, Duration::from_secs(15));
        assert_eq!(settings.check.api_type, ApiType::Direct);
        assert_eq!(settings.paths.results_file, PathBuf::from("out/results.json"));
        assert_eq!(settings.generate.tld_min_sld_length.get("us"), Some(&3));
    }

    #[test]
    fn test_load_json_config_with_string_numbers() {
        let file = write_config(
            ".json",
            r#"{
  "min_sld_length": 2,
  "min_tld_length": "2",
  "max_cache_age_days": 7,
  "thread_count": 10,
  "check_timeout": 10,
  "domainr_api_type": "rapidapi",
  "domainr_api_keys": "",
  "enable_email": false,
  "smtp_port": "465",
  "enable_webhook": "false",
  "webhook_url": ""
}"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(file.path()).unwrap();
        assert_eq!(config.min_tld_length, Some(2));
        assert_eq!(config.smtp_port, Some(465));
        assert_eq!(config.domainr_api_keys, Some(Vec::new()));

        let settings = Settings::from_file_config(config).unwrap();
        assert!(!settings.check.has_api_fallback());
        assert!(!settings.notifications.any_enabled());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let manager = ConfigManager::new(false);

        for content in [
            "thread_count = 0",
            "thread_count = 101",
            "check_timeout = 0",
            "min_tld_length = 0",
            "domainr_api_type = \"oauth\"",
            "thread_count = \"many\"",
            "this is not toml",
        ] {
            let file = write_config(".toml", content);
            let err = manager.load_file(file.path()).unwrap_err();
            assert_eq!(err.exit_code(), 2, "expected config error for {:?}", content);
        }

        let err = manager.load_file("/nonexistent/domain-sweep.toml").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_merge_configs() {
        let lower = FileConfig {
            thread_count: Some(10),
            min_sld_length: Some(2),
            tld_min_sld_length: Some(HashMap::from([("us".to_string(), 3)])),
            ..Default::default()
        };
        let higher = FileConfig {
            thread_count: Some(25),
            tld_min_sld_length: Some(HashMap::from([("in".to_string(), 3)])),
            ..Default::default()
        };

        let merged = lower.merge(higher);
        assert_eq!(merged.thread_count, Some(25));
        assert_eq!(merged.min_sld_length, Some(2));
        assert_eq!(merged.tld_min_sld_length.unwrap().len(), 2);
    }

    #[test]
    fn test_placeholder_resolution() {
        let lookup = |var: &str| (var == "DOMAINR_KEYS").then(|| "k1,k2".to_string());
        assert_eq!(resolve_placeholder("${DOMAINR_KEYS}", lookup), "k1,k2");
        assert_eq!(resolve_placeholder("${MISSING}", lookup), "${MISSING}");
        assert_eq!(resolve_placeholder("plain", lookup), "plain");
        assert_eq!(resolve_placeholder("pre-${DOMAINR_KEYS}", lookup), "pre-${DOMAINR_KEYS}");
    }

    #[test]
    fn test_env_config() {
        let vars = HashMap::from([
            ("DS_THREAD_COUNT", "20"),
            ("DS_CHECK_TIMEOUT", "5s"),
            ("DS_MIN_SLD_LENGTH", "0"),
            ("DS_DOMAINR_API_TYPE", "direct"),
            ("DS_DOMAINR_API_KEYS", "a,,b"),
            ("DS_MAX_CACHE_AGE_DAYS", "soon"),
        ]);
        let env_config = load_env_config_from(false, |key| vars.get(key).map(|v| v.to_string()));

        let values = env_config.values;
        assert_eq!(values.thread_count, Some(20));
        assert_eq!(values.check_timeout, Some(5));
        assert_eq!(values.min_sld_length, None);
        assert_eq!(values.max_cache_age_days, None);
        assert_eq!(values.domainr_api_type, Some("direct".to_string()));
        assert_eq!(
            values.domainr_api_keys,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(env_config.config.is_none());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_file_config(FileConfig::default()).unwrap();
        assert_eq!(settings.generate.min_sld_length, 2);
        assert_eq!(settings.generate.max_sld_length, 2);
        assert_eq!(settings.generate.min_tld_length, 2);
        assert_eq!(settings.check.max_cache_age_days, 7);
        assert_eq!(settings.check.thread_count, 10);
        assert_eq!(settings.check.check_timeout, Duration::from_secs(10));
        assert_eq!(settings.check.api_type, ApiType::RapidApi);
        assert_eq!(settings.tld_source_url, DEFAULT_TLD_SOURCE_URL);
    }
}
