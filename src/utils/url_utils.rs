//! URL normalization and classification utilities.
//!
//! This module provides the canonical URL form used for frontier
//! deduplication, link-cache keys, and baseline hashing.

use anyhow::Result;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

/// Normalize a URL into its canonical crawl form.
///
/// Applied to the seed URL and to every resolved link before
/// deduplication. The transformation:
/// - lowercases scheme and host,
/// - strips default ports (`:80` for http, `:443` for https),
/// - collapses duplicate slashes inside the path,
/// - strips a trailing slash (except for the bare root path),
/// - drops the fragment.
///
/// Normalization is idempotent: `normalize_url(normalize_url(u)) ==
/// normalize_url(u)` for every URL this function accepts.
///
/// # Errors
///
/// Returns an error if the input cannot be parsed as an absolute URL.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut parsed =
        Url::parse(raw.trim()).map_err(|e| anyhow::anyhow!("failed to parse URL {raw}: {e}"))?;

    parsed.set_fragment(None);

    // Url already lowercases scheme/host and strips default ports on parse;
    // the path still needs slash collapsing and trailing-slash removal.
    let collapsed = collapse_duplicate_slashes(parsed.path());
    let trimmed = if collapsed.len() > 1 {
        collapsed.trim_end_matches('/').to_string()
    } else {
        collapsed
    };
    if trimmed != parsed.path() {
        parsed.set_path(&trimmed);
    }

    let mut out = parsed.to_string();
    // Url::to_string renders the bare authority with a trailing "/" root
    // path; keep that single canonical form but drop deeper trailing
    // slashes introduced by set_path round-trips.
    if out.ends_with('/') && parsed.path() != "/" {
        out.pop();
    }
    Ok(out)
}

fn collapse_duplicate_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    out
}

/// Stable hash of a normalized URL, used as the baseline-store key segment.
#[must_use]
pub fn url_hash(normalized_url: &str) -> String {
    format!("{:016x}", xxh3_64(normalized_url.as_bytes()))
}

/// Check whether a URL uses a crawlable http(s) scheme.
///
/// Skips data URLs, javascript URLs, mailto and every other non-http
/// scheme.
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Check whether a URL path ends in one of the configured binary
/// extensions (compared case-insensitively against the final path
/// segment).
#[must_use]
pub fn has_binary_extension(url: &str, extensions: &[String]) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => return false,
    };
    extensions
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext.to_lowercase())))
}

/// Extract the host of a URL for same-domain checks.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_default_port_and_trailing_slash() {
        assert_eq!(
            normalize_url("HTTP://Example.COM:80/a/b/").expect("valid URL"),
            "http://example.com/a/b"
        );
        assert_eq!(
            normalize_url("https://example.com:443/").expect("valid URL"),
            "https://example.com/"
        );
    }

    #[test]
    fn normalize_collapses_duplicate_slashes() {
        assert_eq!(
            normalize_url("https://example.com//a///b").expect("valid URL"),
            "https://example.com/a/b"
        );
    }

    #[test]
    fn normalize_drops_fragment() {
        assert_eq!(
            normalize_url("https://example.com/page#section").expect("valid URL"),
            "https://example.com/page"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "https://example.com//x//y/#frag",
            "http://EXAMPLE.com:80/a/",
            "https://example.com",
        ] {
            let once = normalize_url(raw).expect("valid URL");
            let twice = normalize_url(&once).expect("valid URL");
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }

    #[test]
    fn binary_extension_matching() {
        let exts = vec!["pdf".to_string(), "zip".to_string()];
        assert!(has_binary_extension("https://example.com/file.PDF", &exts));
        assert!(!has_binary_extension("https://example.com/file.html", &exts));
        assert!(!has_binary_extension(
            "https://example.com/pdf-guide",
            &exts
        ));
    }

    #[test]
    fn http_url_filtering() {
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("javascript:void(0)"));
        assert!(!is_http_url("mailto:a@b.c"));
        assert!(!is_http_url("data:text/plain,hi"));
    }
}
