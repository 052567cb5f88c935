//! Syntactic check for the catalog base URL

use once_cell::sync::Lazy;
use regex::Regex;

/// Scheme, then a domain, `localhost` or dotted IPv4, an optional port and an optional path
static CKAN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:http|ftp)s?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("CKAN URL pattern is valid")
});

/// Returns true when `url` looks like a reachable catalog base URL
///
/// Accepts `http`, `https`, `ftp` and `ftps` schemes. No DNS lookup or
/// request is made.
pub fn check_ckan_url(url: &str) -> bool {
    CKAN_URL.is_match(url)
}
