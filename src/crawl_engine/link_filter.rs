//! Link resolution and inclusion filtering
//!
//! Applies the discovery inclusion policy, in order: domain scope,
//! exclude patterns, include patterns, scheme and binary-extension
//! rejection.

use log::debug;
use url::Url;

use crate::config::AuditConfig;
use crate::utils::url_utils::{has_binary_extension, host_of, is_http_url};

/// Resolve an extracted href against the page it appeared on.
///
/// Absolute URLs pass through, protocol-relative URLs inherit the base
/// scheme, relative URLs resolve against the base path. Unresolvable or
/// empty hrefs yield `None`.
#[must_use]
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match base.join(href) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            debug!(target: "sitewarden::links", "unresolvable href {href} on {base}: {e}");
            None
        }
    }
}

/// Apply the inclusion policy to a resolved, normalized URL.
///
/// `base_host` is the host of the seed URL; the comparison is exact
/// (subdomains count as external).
#[must_use]
pub fn should_include(url: &str, base_host: &str, config: &AuditConfig) -> bool {
    // (1) domain scope
    if !config.follow_external_links() {
        match host_of(url) {
            Some(host) if host == base_host => {}
            _ => return false,
        }
    }

    // (2) exclude patterns always win
    for regex in config.exclude_patterns_compiled() {
        if regex.is_match(url) {
            return false;
        }
    }

    // (3) include patterns, when configured, are a whitelist
    if !config.include_patterns_compiled().is_empty()
        && !config
            .include_patterns_compiled()
            .iter()
            .any(|regex| regex.is_match(url))
    {
        return false;
    }

    // (4) crawlable scheme and no binary payload
    if !is_http_url(url) {
        return false;
    }
    if has_binary_extension(url, config.binary_extensions()) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;

    fn config() -> AuditConfig {
        AuditConfig::builder()
            .baseline_dir("./baselines")
            .start_url("https://example.com")
            .build()
            .expect("valid config")
    }

    #[test]
    fn resolves_relative_and_protocol_relative() {
        let base = Url::parse("https://example.com/docs/page").expect("valid base");

        assert_eq!(
            resolve_href(&base, "../about").as_deref(),
            Some("https://example.com/about")
        );
        assert_eq!(
            resolve_href(&base, "//cdn.example.org/x").as_deref(),
            Some("https://cdn.example.org/x")
        );
        assert_eq!(
            resolve_href(&base, "https://other.com/y").as_deref(),
            Some("https://other.com/y")
        );
        assert!(resolve_href(&base, "").is_none());
    }

    #[test]
    fn external_hosts_rejected_by_default() {
        let config = config();
        assert!(should_include(
            "https://example.com/page",
            "example.com",
            &config
        ));
        assert!(!should_include(
            "https://other.com/page",
            "example.com",
            &config
        ));
        // Subdomains are external under exact host comparison
        assert!(!should_include(
            "https://www.example.com/page",
            "example.com",
            &config
        ));
    }

    #[test]
    fn external_hosts_allowed_when_configured() {
        let config = AuditConfig::builder()
            .follow_external_links(true)
            .baseline_dir("./baselines")
            .start_url("https://example.com")
            .build()
            .expect("valid config");
        assert!(should_include(
            "https://other.com/page",
            "example.com",
            &config
        ));
    }

    #[test]
    fn exclude_patterns_beat_include_patterns() {
        let config = AuditConfig::builder()
            .include_patterns(vec!["*example.com*".to_string()])
            .exclude_patterns(vec!["*/admin/*".to_string()])
            .baseline_dir("./baselines")
            .start_url("https://example.com")
            .build()
            .expect("valid config");

        assert!(should_include(
            "https://example.com/docs",
            "example.com",
            &config
        ));
        assert!(!should_include(
            "https://example.com/admin/panel",
            "example.com",
            &config
        ));
    }

    #[test]
    fn binary_extensions_and_non_http_rejected() {
        let config = config();
        assert!(!should_include(
            "https://example.com/report.pdf",
            "example.com",
            &config
        ));
        assert!(!should_include("ftp://example.com/x", "example.com", &config));
    }
}
