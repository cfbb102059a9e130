//! Utility functions for domain processing and validation.
//!
//! Helpers shared by the generator, the checker and the CLI: domain
//! validation, splitting a domain into SLD/TLD, and parsing newline-delimited
//! domain files.

use crate::error::DomainSweepError;
use std::collections::HashSet;
use std::path::Path;

/// Validate a fully qualified domain name and return it lowercased.
///
/// Internationalized names are returned in their ASCII (punycode) form, so
/// `bücher.de` becomes `xn--bcher-kva.de`.
///
/// # Errors
///
/// Returns `DomainSweepError::InvalidDomain` for empty input, a missing dot,
/// a name IDNA cannot convert, or a label that is empty, too long, or
/// starts/ends with a hyphen.
pub fn validate_domain(domain: &str) -> Result<String, DomainSweepError> {
    let mut domain = domain.trim().trim_end_matches('.').to_lowercase();

    if !domain.is_ascii() {
        domain = idna::domain_to_ascii(&domain).map_err(|e| {
            DomainSweepError::invalid_domain(
                domain.clone(),
                format!("IDNA conversion failed: {}", e),
            )
        })?;
    }

    if domain.is_empty() {
        return Err(DomainSweepError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if !is_valid_fqdn(&domain) {
        return Err(DomainSweepError::invalid_domain(
            domain,
            "Expected a name like 'ab.us' with letters, digits and inner hyphens",
        ));
    }

    Ok(domain)
}

/// Parse newline-delimited domains.
///
/// Blank lines and `#` comments are skipped, entries are trimmed and
/// lowercased, invalid names are dropped, and duplicates keep their first
/// position.
pub fn parse_domain_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match validate_domain(line) {
            Ok(domain) => Some(domain),
            Err(e) => {
                tracing::warn!("Skipping domain list entry: {}", e);
                None
            }
        })
        .filter(|domain| seen.insert(domain.clone()))
        .collect()
}

/// Read and parse a newline-delimited domains file.
pub fn read_domain_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DomainSweepError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        DomainSweepError::file_error(
            path.to_string_lossy(),
            format!("Failed to read domains file: {}", e),
        )
    })?;
    Ok(parse_domain_list(&content))
}

/// Write one entry per line, creating parent directories as needed.
pub fn write_lines<P, I, S>(path: P, lines: I) -> Result<usize, DomainSweepError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    use std::io::Write;

    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let file = std::fs::File::create(path).map_err(|e| {
        DomainSweepError::file_error(path.to_string_lossy(), format!("Failed to create file: {}", e))
    })?;
    let mut writer = std::io::BufWriter::new(file);
    let mut count = 0;
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| {
            DomainSweepError::file_error(path.to_string_lossy(), format!("Write failed: {}", e))
        })?;
        count += 1;
    }
    writer.flush().map_err(|e| {
        DomainSweepError::file_error(path.to_string_lossy(), format!("Write failed: {}", e))
    })?;
    Ok(count)
}

/// Write `contents` to `path` through a temporary sibling and a rename, so a
/// crash never leaves a half-written state file behind.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), DomainSweepError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents).map_err(|e| {
        DomainSweepError::file_error(tmp_path.to_string_lossy(), format!("Write failed: {}", e))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        DomainSweepError::file_error(path.to_string_lossy(), format!("Rename failed: {}", e))
    })
}

fn ensure_parent_dir(path: &Path) -> Result<(), DomainSweepError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainSweepError::file_error(
                    parent.to_string_lossy(),
                    format!("Failed to create directory: {}", e),
                )
            })?;
        }
    }
    Ok(())
}

/// Validate a single DNS label (letters, digits, inner hyphens, 1-63 chars).
pub(crate) fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Validate that an FQDN has basic valid structure.
fn is_valid_fqdn(domain: &str) -> bool {
    if domain.len() < 3 || domain.len() > 253 {
        return false;
    }

    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() < 2 {
        return false;
    }

    parts.iter().all(|part| is_valid_label(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain() {
        assert_eq!(validate_domain("Example.COM").unwrap(), "example.com");
        assert_eq!(validate_domain(" ab.us. ").unwrap(), "ab.us");
        assert!(validate_domain("").is_err());
        assert!(validate_domain("nodot").is_err());
        assert!(validate_domain("-ab.us").is_err());
        assert!(validate_domain("ab..us").is_err());
    }

    #[test]
    fn test_validate_domain_converts_idn() {
        assert_eq!(validate_domain("bücher.de").unwrap(), "xn--bcher-kva.de");
        assert_eq!(validate_domain(" MÜNCHEN.de ").unwrap(), "xn--mnchen-3ya.de");
        assert_eq!(validate_domain("xn--bcher-kva.de").unwrap(), "xn--bcher-kva.de");
        assert!(validate_domain("bü cher.de").is_err());
    }

    #[test]
    fn test_parse_domain_list_keeps_idn() {
        let content = "bücher.de\nxn--bcher-kva.de\nab.us\n";
        assert_eq!(parse_domain_list(content), vec!["xn--bcher-kva.de", "ab.us"]);
    }

    #[test]
    fn test_parse_domain_list() {
        let content = "ab.us\n\n# comment\nAB.US\nxy.io\n  cd.de  \nbad_name\n";
        assert_eq!(parse_domain_list(content), vec!["ab.us", "xy.io", "cd.de"]);
    }

    #[test]
    fn test_is_valid_label() {
        assert!(is_valid_label("ab"));
        assert!(is_valid_label("a-b"));
        assert!(is_valid_label("x1"));

        assert!(!is_valid_label(""));
        assert!(!is_valid_label("-ab"));
        assert!(!is_valid_label("ab-"));
        assert!(!is_valid_label("Ab"));
        assert!(!is_valid_label("a.b"));
    }

    #[test]
    fn test_write_lines_and_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("nested/out.txt");
        let count = write_lines(&list, ["ab.us", "xy.io"]).unwrap();
        assert_eq!(count, 2);
        assert_eq!(std::fs::read_to_string(&list).unwrap(), "ab.us\nxy.io\n");

        let state = dir.path().join("state.json");
        write_atomic(&state, "{}").unwrap();
        write_atomic(&state, "{\"a\":1}").unwrap();
        assert_eq!(std::fs::read_to_string(&state).unwrap(), "{\"a\":1}");
        assert!(!dir.path().join("state.json.tmp").exists());
    }
}
