use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;


// scheme, then dotted hostname with a 2-6 letter TLD, localhost or IPv4,
// optional port, optional path or query
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|",
        r"localhost|",
        r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})",
        r"(?::[0-9]+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("URL pattern is valid")
});

/// Checks `url` against the absolute HTTP(S) URL grammar accepted for auditing.
///
/// Pure and case-insensitive; never touches the network.
pub fn validate(url: &str) -> bool {
    let valid = URL_PATTERN.is_match(url);
    debug!("URL {:?} valid: {}", url, valid);
    valid
}

/// Returns the URLs failing [`validate`], in input order
pub fn invalid_urls<S: AsRef<str>>(urls: &[S]) -> Vec<&str> {
    let invalid: Vec<&str> = urls
        .iter()
        .map(AsRef::as_ref)
        .filter(|url| !validate(url))
        .collect();
    if !invalid.is_empty() {
        warn!("Rejected {} invalid URL(s): {}", invalid.len(), invalid.join(", "));
    }
    invalid
}
