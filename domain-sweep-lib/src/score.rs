//! Desirability score for available domains.

/// Score a domain from 0 to 100.
///
/// Shorter SLDs score higher (up to 3 chars: 40, up to 5: 30, else 10),
/// `com` adds 30, `net`/`org` 20 and any other TLD 10. A hyphen or digit in
/// the SLD costs 20. Names that are not exactly `sld.tld` score 0.
pub fn score_domain(domain: &str) -> u8 {
    let Some((sld, tld)) = domain.split_once('.') else {
        return 0;
    };
    if sld.is_empty() || tld.is_empty() || tld.contains('.') {
        return 0;
    }

    let mut score: i32 = match sld.len() {
        0..=3 => 40,
        4..=5 => 30,
        _ => 10,
    };
    score += match tld {
        "com" => 30,
        "net" | "org" => 20,
        _ => 10,
    };
    if sld.contains('-') || sld.chars().any(|c| c.is_ascii_digit()) {
        score -= 20;
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_domain() {
        assert_eq!(score_domain("ab.com"), 70);
        assert_eq!(score_domain("ab.us"), 50);
        assert_eq!(score_domain("abcd.org"), 50);
        assert_eq!(score_domain("abcdef.io"), 20);
        assert_eq!(score_domain("a1.net"), 40);
        assert_eq!(score_domain("long-name.xyz"), 0);
    }

    #[test]
    fn test_malformed_domains_score_zero() {
        assert_eq!(score_domain("nodot"), 0);
        assert_eq!(score_domain("a.b.c"), 0);
        assert_eq!(score_domain(".com"), 0);
    }
}
