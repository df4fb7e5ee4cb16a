//! Custom domain name normalization.

use regex::Regex;
use std::sync::LazyLock;

static FQDN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("Invalid domain regex")
});

const MAX_LEN: usize = 253;

/// Lowercases, trims whitespace and a trailing root dot, then checks the result is a
/// fully qualified host name with at least two labels.
pub fn normalize(raw: &str) -> Result<String, String> {
    let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if name.is_empty() {
        return Err("domain name is empty".into());
    }
    if name.len() > MAX_LEN {
        return Err(format!("{name} is longer than {MAX_LEN} characters"));
    }
    if !FQDN.is_match(&name) {
        return Err(format!("{name} is not a valid domain name"));
    }
    Ok(name)
}

/// True when `name` is `parent` or one of its subdomains.
pub fn is_within(name: &str, parent: &str) -> bool {
    name == parent
        || name
            .strip_suffix(parent)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes() {
        assert_eq!(normalize(" Example.COM. ").unwrap(), "example.com");
        assert_eq!(normalize("shop.my-brand.co.uk").unwrap(), "shop.my-brand.co.uk");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in [
            "",
            "localhost",
            "-bad.com",
            "bad-.com",
            "under_score.com",
            "example.c",
            "example.123",
            "a..b.com",
            "https://example.com",
        ] {
            assert!(normalize(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn label_length_is_bounded() {
        let ok = format!("{}.com", "a".repeat(63));
        let too_long = format!("{}.com", "a".repeat(64));
        assert!(normalize(&ok).is_ok());
        assert!(normalize(&too_long).is_err());
    }

    #[test]
    fn within_parent() {
        assert!(is_within("aurelio.app", "aurelio.app"));
        assert!(is_within("shop.aurelio.app", "aurelio.app"));
        assert!(!is_within("notaurelio.app", "aurelio.app"));
    }
}
