use once_cell::sync::Lazy;
use regex::Regex;

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

pub const SUSPICIOUS_KEYWORDS: [&str; 6] =
    ["login", "verify", "update", "account", "secure", "bank"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspiciousUrl {
    pub url: String,
    pub keyword: &'static str,
}

/// Returns true when any http(s) URL in `text` carries a suspicious keyword
/// in its authority or path. Plain, case-sensitive substring match on the
/// text as written: "mybanking.com" counts as "bank", "MyBANK.com" does not.
pub fn has_phishing_url(text: &str) -> bool {
    URL_REGEX
        .find_iter(text)
        .any(|m| matched_keyword(m.as_str()).is_some())
}

/// Every suspicious URL in `text`, each with the first keyword it matched.
pub fn suspicious_urls(text: &str) -> Vec<SuspiciousUrl> {
    URL_REGEX
        .find_iter(text)
        .filter_map(|m| {
            matched_keyword(m.as_str()).map(|keyword| SuspiciousUrl {
                url: m.as_str().to_string(),
                keyword,
            })
        })
        .collect()
}

fn matched_keyword(raw_url: &str) -> Option<&'static str> {
    let (authority, path) = split_url(raw_url);
    SUSPICIOUS_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| authority.contains(keyword) || path.contains(keyword))
}

/// Splits a URL into its raw authority (userinfo, host and port exactly as
/// written) and raw path. No validation: a bad port or bracket still yields text.
fn split_url(raw_url: &str) -> (&str, &str) {
    let rest = raw_url.split_once("://").map_or(raw_url, |(_, rest)| rest);
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
    (authority, &tail[..path_end])
}
