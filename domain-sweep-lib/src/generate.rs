//! Candidate domain generation.
//!
//! Enumerates every SLD over `a-z` in the configured length range (optionally
//! starting with a fixed prefix) and pairs it with every eligible TLD. The
//! output is a lazy sequence: nothing is materialized until iterated, and
//! `candidates()` can be called again to restart from the beginning.
//!
//! # Ordering
//!
//! SLDs are ordered lexicographically, so a shorter name comes right before
//! its own extensions (`a`, `aa`, `ab`, ..., `az`, `b`, ...). For each SLD the
//! TLDs follow the order of the TLD list.
//!
//! # Examples
//!
//! ```
//! use domain_sweep_lib::{DomainGenerator, GenerateConfig, ReservedSet};
//!
//! let config = GenerateConfig::default()
//!     .with_prefix_domain("ab")
//!     .with_prefix_tld("us");
//! let tlds = vec!["us".to_string(), "io".to_string()];
//! let generator = DomainGenerator::new(config, tlds, ReservedSet::default()).unwrap();
//!
//! let names: Vec<String> = generator.candidates().map(|c| c.full).collect();
//! assert_eq!(names, vec!["ab.us"]);
//! ```

use crate::error::DomainSweepError;
use crate::reserved::ReservedSet;
use crate::types::{CandidateDomain, GenerateConfig};
use crate::utils::write_lines;
use crate::words::WordList;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Generates candidate domains from a configuration, a TLD list and the
/// reserved set.
#[derive(Debug, Clone)]
pub struct DomainGenerator {
    config: GenerateConfig,
    tlds: Vec<String>,
    reserved: ReservedSet,
    words: Option<WordList>,
}

impl DomainGenerator {
    /// Validate the configuration and prepare the TLD list.
    ///
    /// TLDs are lowercased, de-duplicated (first occurrence wins) and
    /// filtered by `prefix_tld` and `min_tld_length`. With `only_words` set
    /// the built-in word list is used until `with_word_list` replaces it.
    ///
    /// # Errors
    ///
    /// `ConfigError` for zero or inverted lengths and prefixes with
    /// characters outside `a-z0-9-`; `SourceUnavailable` for an empty TLD
    /// list.
    pub fn new(
        config: GenerateConfig,
        tlds: Vec<String>,
        reserved: ReservedSet,
    ) -> Result<Self, DomainSweepError> {
        validate_config(&config)?;

        if tlds.is_empty() {
            return Err(DomainSweepError::source_unavailable(
                "TLD list",
                "no TLDs available to generate candidates",
            ));
        }

        let mut seen = HashSet::new();
        let tlds: Vec<String> = tlds
            .into_iter()
            .map(|t| t.trim().trim_start_matches('.').to_lowercase())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .filter(|t| t.len() >= config.min_tld_length)
            .filter(|t| match &config.prefix_tld {
                Some(prefix) => t.starts_with(prefix.as_str()),
                None => true,
            })
            .collect();

        if tlds.is_empty() {
            warn!("No TLDs match the configured TLD prefix and length; nothing to generate");
        }

        let words = config
            .only_words
            .then(|| WordList::builtin(config.target_word_length));

        Ok(Self {
            config,
            tlds,
            reserved,
            words,
        })
    }

    /// Use a specific word list for the word filter.
    pub fn with_word_list(mut self, words: WordList) -> Self {
        if self.config.only_words {
            self.words = Some(words);
        }
        self
    }

    /// Eligible TLDs, in generation order.
    pub fn tlds(&self) -> &[String] {
        &self.tlds
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// A fresh lazy iterator over all candidates.
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            generator: self,
            slds: SldOdometer::new(
                self.config.prefix_domain.clone().unwrap_or_default(),
                self.config.min_sld_length,
                self.config.max_sld_length,
            ),
            sld: None,
            tld_index: 0,
        }
    }

    /// Upper bound on the number of candidates before filtering.
    pub fn estimate_count(&self) -> u64 {
        let prefix_len = self
            .config
            .prefix_domain
            .as_ref()
            .map(String::len)
            .unwrap_or(0);
        let start = self.config.min_sld_length.max(prefix_len);
        let slds = (start..=self.config.max_sld_length).fold(0u64, |acc, len| {
            let free = u32::try_from(len - prefix_len).unwrap_or(u32::MAX);
            acc.saturating_add(26u64.saturating_pow(free))
        });
        slds.saturating_mul(self.tlds.len() as u64)
    }

    /// Write all candidates to `path`, one per line. Returns the count.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<usize, DomainSweepError> {
        let path = path.as_ref();
        let count = write_lines(path, self.candidates().map(|c| c.full))?;
        info!(
            "Generated {} candidate domains and saved to {}",
            count,
            path.display()
        );
        Ok(count)
    }

    fn accepts(&self, sld: &str, tld: &str) -> bool {
        if let Some(min) = self.config.tld_min_sld_length.get(tld) {
            if sld.len() < *min {
                return false;
            }
        }
        if self.reserved.excludes(sld, tld) {
            return false;
        }
        match &self.words {
            Some(words) => words.forms_word(sld, tld),
            None => true,
        }
    }
}

fn validate_config(config: &GenerateConfig) -> Result<(), DomainSweepError> {
    if config.min_sld_length == 0 {
        return Err(DomainSweepError::config("min_sld_length must be at least 1"));
    }
    if config.min_tld_length == 0 {
        return Err(DomainSweepError::config("min_tld_length must be at least 1"));
    }
    if config.max_sld_length < config.min_sld_length {
        return Err(DomainSweepError::config(format!(
            "max_sld_length ({}) is smaller than min_sld_length ({})",
            config.max_sld_length, config.min_sld_length
        )));
    }
    if config.only_words && config.target_word_length == 0 {
        return Err(DomainSweepError::config(
            "target_word_length must be at least 1",
        ));
    }
    for (name, prefix) in [
        ("prefix_domain", &config.prefix_domain),
        ("prefix_tld", &config.prefix_tld),
    ] {
        if let Some(prefix) = prefix {
            let valid = prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if !valid {
                return Err(DomainSweepError::config(format!(
                    "{} '{}' may only contain a-z, 0-9 and '-'",
                    name, prefix
                )));
            }
        }
    }
    Ok(())
}

/// Lazy SLD x TLD iterator returned by [`DomainGenerator::candidates`].
pub struct Candidates<'a> {
    generator: &'a DomainGenerator,
    slds: SldOdometer,
    sld: Option<String>,
    tld_index: usize,
}

impl Iterator for Candidates<'_> {
    type Item = CandidateDomain;

    fn next(&mut self) -> Option<CandidateDomain> {
        let generator = self.generator;
        let tlds = &generator.tlds;
        if tlds.is_empty() {
            return None;
        }

        loop {
            if self.sld.is_none() || self.tld_index >= tlds.len() {
                self.sld = Some(self.slds.next()?);
                self.tld_index = 0;
            }

            let tld = &tlds[self.tld_index];
            self.tld_index += 1;

            if let Some(sld) = self.sld.as_deref() {
                if generator.accepts(sld, tld) {
                    return Some(CandidateDomain::new(sld, tld));
                }
            }
        }
    }
}

/// Enumerates `prefix + [a-z]*` in lexicographic order.
///
/// A pre-order walk over the letters after the prefix: a name comes right
/// before its own extensions (`a`, `aa`, `ab`, ..., `az`, `b`, ...). Names
/// shorter than the minimum length are walked through but not emitted.
struct SldOdometer {
    prefix: String,
    min_free: usize,
    max_free: usize,
    counters: Vec<usize>,
    started: bool,
    done: bool,
}

impl SldOdometer {
    fn new(prefix: String, min_length: usize, max_length: usize) -> Self {
        let done = prefix.len() > max_length || min_length > max_length;
        Self {
            min_free: min_length.saturating_sub(prefix.len()),
            max_free: max_length.saturating_sub(prefix.len()),
            prefix,
            counters: Vec::new(),
            started: false,
            done,
        }
    }

    /// Move to the next name in pre-order. Returns false when the walk ends.
    fn step(&mut self) -> bool {
        if self.counters.len() < self.max_free {
            self.counters.push(0);
            return true;
        }
        while let Some(last) = self.counters.last_mut() {
            *last += 1;
            if *last < ALPHABET.len() {
                return true;
            }
            self.counters.pop();
        }
        false
    }
}

impl Iterator for SldOdometer {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.done {
                return None;
            }
            if !self.started {
                self.started = true;
            } else if !self.step() {
                self.done = true;
                return None;
            }

            if self.counters.len() >= self.min_free {
                return Some(
                    self.prefix
                        .chars()
                        .chain(self.counters.iter().map(|&i| ALPHABET[i] as char))
                        .collect(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn names(generator: &DomainGenerator) -> Vec<String> {
        generator.candidates().map(|c| c.full).collect()
    }

    #[test]
    fn test_prefix_scenario() {
        let config = GenerateConfig::default()
            .with_prefix_domain("ab")
            .with_prefix_tld("us");
        let generator =
            DomainGenerator::new(config, tlds(&["us", "io"]), ReservedSet::default()).unwrap();
        assert_eq!(names(&generator), vec!["ab.us"]);
    }

    #[test]
    fn test_full_two_letter_space() {
        let generator = DomainGenerator::new(
            GenerateConfig::default(),
            tlds(&["us", "io"]),
            ReservedSet::default(),
        )
        .unwrap();
        let all = names(&generator);

        // 676 SLDs x 2 TLDs, minus "us.us" and "io.io"
        assert_eq!(all.len(), 676 * 2 - 2);
        assert_eq!(&all[..4], &["aa.us", "aa.io", "ab.us", "ab.io"]);
        assert_eq!(all.last().map(String::as_str), Some("zz.io"));

        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_candidates_restart() {
        let config = GenerateConfig::default().with_prefix_domain("q");
        let generator =
            DomainGenerator::new(config, tlds(&["de"]), ReservedSet::default()).unwrap();
        let first: Vec<_> = generator.candidates().take(3).collect();
        let second: Vec<_> = generator.candidates().take(3).collect();
        assert_eq!(first, second);
        assert_eq!(first[0].full, "qa.de");
    }

    #[test]
    fn test_length_range_is_lexicographic() {
        let config = GenerateConfig::default().with_sld_lengths(1, 2);
        let generator =
            DomainGenerator::new(config, tlds(&["com"]), ReservedSet::default()).unwrap();
        let slds: Vec<String> = names(&generator)
            .into_iter()
            .map(|name| name.trim_end_matches(".com").to_string())
            .collect();

        assert_eq!(slds.len(), 26 + 26 * 26);
        assert_eq!(&slds[..3], &["a", "aa", "ab"]);
        assert_eq!(slds[26], "az");
        assert_eq!(&slds[27..29], &["b", "ba"]);
        assert_eq!(slds.last().map(String::as_str), Some("zz"));

        let mut sorted = slds.clone();
        sorted.sort();
        assert_eq!(slds, sorted);
    }

    #[test]
    fn test_prefix_comes_before_its_extensions() {
        let config = GenerateConfig::default()
            .with_sld_lengths(1, 2)
            .with_prefix_domain("z");
        let generator =
            DomainGenerator::new(config, tlds(&["io"]), ReservedSet::default()).unwrap();
        let all = names(&generator);
        assert_eq!(all.len(), 27);
        assert_eq!(all[0], "z.io");
        assert_eq!(all[1], "za.io");
        assert_eq!(all[26], "zz.io");
    }

    #[test]
    fn test_reserved_and_length_invariants() {
        let reserved = ReservedSet::new(["ab", "cdus", "io"]);
        let mut config = GenerateConfig::default();
        config.min_tld_length = 2;
        let generator =
            DomainGenerator::new(config, tlds(&["us", "io", "x", "com"]), reserved.clone())
                .unwrap();

        assert_eq!(generator.tlds(), &["us", "io", "com"]);
        for candidate in generator.candidates() {
            assert!(candidate.sld.len() >= 2);
            assert!(candidate.tld.len() >= 2);
            assert!(!reserved.excludes(&candidate.sld, &candidate.tld));
        }
        assert!(!names(&generator).contains(&"cd.us".to_string()));
    }

    #[test]
    fn test_tld_list_normalized() {
        let generator = DomainGenerator::new(
            GenerateConfig::default().with_prefix_domain("ab"),
            tlds(&["US", ".io", "us", ""]),
            ReservedSet::default(),
        )
        .unwrap();
        assert_eq!(generator.tlds(), &["us", "io"]);
        assert_eq!(names(&generator), vec!["ab.us", "ab.io"]);
    }

    #[test]
    fn test_only_words() {
        let config = GenerateConfig::default().with_only_words(true);
        let generator = DomainGenerator::new(config, tlds(&["de", "me", "io"]), ReservedSet::default())
            .unwrap()
            .with_word_list(WordList::from_text("code home node", 4));
        let mut all = names(&generator);
        all.sort();
        assert_eq!(all, vec!["co.de", "ho.me", "no.de"]);
    }

    #[test]
    fn test_per_tld_minimum_sld_length() {
        let mut config = GenerateConfig::default()
            .with_sld_lengths(2, 3)
            .with_prefix_domain("ab");
        config.tld_min_sld_length.insert("us".to_string(), 3);
        let generator =
            DomainGenerator::new(config, tlds(&["us", "io"]), ReservedSet::default()).unwrap();
        let all = names(&generator);
        assert!(!all.contains(&"ab.us".to_string()));
        assert!(all.contains(&"ab.io".to_string()));
        assert!(all.contains(&"abc.us".to_string()));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut zero = GenerateConfig::default();
        zero.min_sld_length = 0;
        let err = DomainGenerator::new(zero, tlds(&["us"]), ReservedSet::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let inverted = GenerateConfig::default().with_sld_lengths(3, 2);
        assert!(DomainGenerator::new(inverted, tlds(&["us"]), ReservedSet::default()).is_err());

        let mut bad_prefix = GenerateConfig::default();
        bad_prefix.prefix_domain = Some("a_".to_string());
        assert!(DomainGenerator::new(bad_prefix, tlds(&["us"]), ReservedSet::default()).is_err());
    }

    #[test]
    fn test_empty_tld_list_is_source_unavailable() {
        let err = DomainGenerator::new(GenerateConfig::default(), Vec::new(), ReservedSet::default())
            .unwrap_err();
        assert!(matches!(err, DomainSweepError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_prefix_longer_than_max_length_yields_nothing() {
        let config = GenerateConfig::default().with_prefix_domain("abc");
        let generator =
            DomainGenerator::new(config, tlds(&["us"]), ReservedSet::default()).unwrap();
        assert_eq!(generator.candidates().count(), 0);
        assert_eq!(generator.estimate_count(), 0);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output/generated_domains.txt");
        let generator = DomainGenerator::new(
            GenerateConfig::default().with_prefix_domain("ab"),
            tlds(&["us", "io"]),
            ReservedSet::default(),
        )
        .unwrap();
        assert_eq!(generator.write_to(&path).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab.us\nab.io\n");
    }
}
