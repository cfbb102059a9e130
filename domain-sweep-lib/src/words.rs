//! Dictionary used by the generator's word filter.
//!
//! With `only_words` enabled a candidate survives only when its SLD and TLD
//! read as one dictionary word ("co" + "de" -> "code"). The list is
//! restricted to a single target length, four letters by default.

use crate::error::DomainSweepError;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Built-in list of common four-letter words.
const BUILTIN_WORDS: &str = include_str!("../data/words4.txt");

/// A set of lowercase words of one fixed length.
#[derive(Debug, Clone)]
pub struct WordList {
    words: HashSet<String>,
    target_length: usize,
}

impl WordList {
    /// Build a list from arbitrary text: whitespace separated words, `#`
    /// comment lines ignored. Words with non-ASCII-letter characters or a
    /// different length are dropped, everything else is lowercased.
    pub fn from_text(text: &str, target_length: usize) -> Self {
        let words = text
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .flat_map(str::split_whitespace)
            .filter(|word| word.len() == target_length)
            .filter(|word| word.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_lowercase)
            .collect();
        Self {
            words,
            target_length,
        }
    }

    /// The built-in word list.
    pub fn builtin(target_length: usize) -> Self {
        Self::from_text(BUILTIN_WORDS, target_length)
    }

    /// Load a word list file (e.g. `/usr/share/dict/words`).
    pub fn load<P: AsRef<Path>>(path: P, target_length: usize) -> Result<Self, DomainSweepError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read word list: {}", e),
            )
        })?;
        let list = Self::from_text(&content, target_length);
        if list.is_empty() {
            return Err(DomainSweepError::config(format!(
                "Word list {} has no {}-letter words",
                path.display(),
                target_length
            )));
        }
        info!(
            "Loaded {} {}-letter words from {}",
            list.len(),
            target_length,
            path.display()
        );
        Ok(list)
    }

    /// Whether `sld + tld` is a word of the target length.
    pub fn forms_word(&self, sld: &str, tld: &str) -> bool {
        if sld.len() + tld.len() != self.target_length {
            return false;
        }
        let word = format!("{}{}", sld, tld).to_lowercase();
        self.words.contains(&word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn target_length(&self) -> usize {
        self.target_length
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
