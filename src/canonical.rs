//! URL canonicalization for imported bookmarks
//!
//! Validates one URL against a [`UrlPolicy`] (protocol allow-list, hostname
//! block-list, query-param block-list) and rewrites it into its canonical
//! form. Canonicalizing an already canonical URL returns it unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Why a raw URL was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlRejection {
    #[error("unparsable url: {0}")]
    Unparsable(String),
    #[error("protocol not allowed: {0}")]
    DisallowedProtocol(String),
    #[error("hostname blocked: {0}")]
    BlockedHostname(String),
}

/// Sanitation rules applied to every imported URL.
///
/// An empty list disables the corresponding rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlPolicy {
    /// Schemes that may be imported, with or without trailing `:`
    pub allowed_protocols: Vec<String>,
    /// Exact hostnames that are never imported
    pub blocked_hostnames: Vec<String>,
    /// Query keys stripped from every URL
    pub blocked_search_params: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            allowed_protocols: vec!["https".to_string()],
            blocked_hostnames: Vec::new(),
            blocked_search_params: [
                "utm_source",
                "utm_medium",
                "utm_campaign",
                "utm_term",
                "utm_content",
                "fbclid",
                "gclid",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl UrlPolicy {
    /// A policy with every rule disabled
    pub fn permissive() -> Self {
        Self {
            allowed_protocols: Vec::new(),
            blocked_hostnames: Vec::new(),
            blocked_search_params: Vec::new(),
        }
    }

    fn allows_protocol(&self, scheme: &str) -> bool {
        self.allowed_protocols.is_empty()
            || self
                .allowed_protocols
                .iter()
                .any(|p| p.trim_end_matches(':').eq_ignore_ascii_case(scheme))
    }

    fn blocks_host(&self, host: &str) -> bool {
        self.blocked_hostnames
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host))
    }

    fn blocks_param(&self, key: &str) -> bool {
        self.blocked_search_params.iter().any(|p| p == key)
    }
}

/// Canonicalize `raw`, or `None` if the policy rejects it
pub fn canonicalize(raw: &str, policy: &UrlPolicy) -> Option<String> {
    try_canonicalize(raw, policy).ok()
}

/// Canonicalize `raw`, reporting why it was rejected
pub fn try_canonicalize(raw: &str, policy: &UrlPolicy) -> Result<String, UrlRejection> {
    let mut url =
        Url::parse(raw.trim()).map_err(|_| UrlRejection::Unparsable(raw.to_string()))?;

    if !policy.allows_protocol(url.scheme()) {
        return Err(UrlRejection::DisallowedProtocol(url.scheme().to_string()));
    }

    if let Some(host) = url.host_str() {
        if policy.blocks_host(host) {
            return Err(UrlRejection::BlockedHostname(host.to_string()));
        }
    }

    if !policy.blocked_search_params.is_empty() {
        strip_params(&mut url, policy);
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Remove blocked query keys, keeping the order of the rest.
///
/// The query is only re-encoded when something was actually removed.
fn strip_params(url: &mut Url, policy: &UrlPolicy) {
    if url.query().is_none() {
        return;
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| !policy.blocks_param(k))
        .collect();

    if kept.len() == pairs.len() {
        return;
    }

    if kept.is_empty() {
        url.set_query(None);
        return;
    }

    let mut encoded = url.query_pairs_mut();
    encoded.clear();
    for (k, v) in kept {
        encoded.append_pair(k, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_slash_removed() {
        let policy = UrlPolicy::default();
        assert_eq!(
            canonicalize("https://example.com/", &policy),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            canonicalize("https://example.com/docs/", &policy),
            Some("https://example.com/docs".to_string())
        );
        assert_eq!(
            canonicalize("https://example.com/docs//", &policy),
            Some("https://example.com/docs".to_string())
        );
    }

    #[test]
    fn test_unparsable() {
        let policy = UrlPolicy::default();
        assert_eq!(
            try_canonicalize("not a url", &policy),
            Err(UrlRejection::Unparsable("not a url".to_string()))
        );
        assert_eq!(canonicalize("", &policy), None);
    }

    #[test]
    fn test_protocol_allow_list() {
        let policy = UrlPolicy::default();
        assert_eq!(
            try_canonicalize("http://example.com", &policy),
            Err(UrlRejection::DisallowedProtocol("http".to_string()))
        );
        assert_eq!(canonicalize("javascript:alert(1)", &policy), None);
        assert_eq!(canonicalize("place:sort=8&maxResults=10", &policy), None);

        let colon = UrlPolicy {
            allowed_protocols: vec!["HTTP:".to_string()],
            ..UrlPolicy::permissive()
        };
        assert_eq!(
            canonicalize("http://example.com/a", &colon),
            Some("http://example.com/a".to_string())
        );
    }

    #[test]
    fn test_empty_allow_list_accepts_any_scheme() {
        let policy = UrlPolicy::permissive();
        assert_eq!(
            canonicalize("ftp://files.example.com/pub/", &policy),
            Some("ftp://files.example.com/pub".to_string())
        );
    }

    #[test]
    fn test_blocked_hostname() {
        let policy = UrlPolicy {
            blocked_hostnames: vec!["localhost".to_string(), "Tracker.Example.com".to_string()],
            ..UrlPolicy::default()
        };
        assert_eq!(
            try_canonicalize("https://localhost/admin", &policy),
            Err(UrlRejection::BlockedHostname("localhost".to_string()))
        );
        assert_eq!(canonicalize("https://tracker.example.com/x", &policy), None);
        assert!(canonicalize("https://sub.tracker.example.com/x", &policy).is_some());
    }

    #[test]
    fn test_blocked_params_preserve_order() {
        let policy = UrlPolicy::default();
        assert_eq!(
            canonicalize(
                "https://example.com/page?b=2&utm_source=news&a=1&fbclid=xyz",
                &policy
            ),
            Some("https://example.com/page?b=2&a=1".to_string())
        );
    }

    #[test]
    fn test_only_blocked_params_drops_query() {
        let policy = UrlPolicy::default();
        assert_eq!(
            canonicalize("https://example.com/?utm_source=a&utm_medium=b", &policy),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_query_untouched_without_blocked_params() {
        let policy = UrlPolicy::default();
        assert_eq!(
            canonicalize("https://example.com/search?q=a%20b&x", &policy),
            Some("https://example.com/search?q=a%20b&x".to_string())
        );
    }

    #[test]
    fn test_policy_from_yaml_defaults_missing_keys() {
        let yaml = "blocked_hostnames: [intranet.local]\n";
        let policy: UrlPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.blocked_hostnames, vec!["intranet.local".to_string()]);
        assert_eq!(policy.allowed_protocols, vec!["https".to_string()]);
        assert!(policy.blocked_search_params.contains(&"gclid".to_string()));
    }

    proptest! {
        #[test]
        fn prop_canonicalize_idempotent(
            host in "[a-z]{1,10}\\.(com|org|net)",
            path in "(/[a-zA-Z0-9_-]{0,6}){0,4}/{0,2}",
            query in proptest::option::of("[a-z_]{1,8}=[a-z0-9]{0,4}(&[a-z_]{1,8}=[a-z0-9]{0,4}){0,3}"),
        ) {
            let policy = UrlPolicy::default();
            let raw = match &query {
                Some(q) => format!("https://{host}{path}?{q}"),
                None => format!("https://{host}{path}"),
            };
            if let Some(once) = canonicalize(&raw, &policy) {
                prop_assert!(!once.ends_with('/'));
                prop_assert_eq!(canonicalize(&once, &policy), Some(once.clone()));
            }
        }

        #[test]
        fn prop_blocked_params_never_survive(
            keep in "[a-z]{1,6}",
            blocked in prop::sample::select(vec!["utm_source", "utm_campaign", "fbclid", "gclid"]),
        ) {
            prop_assume!(!keep.starts_with("utm") && keep != "fbclid" && keep != "gclid");
            let policy = UrlPolicy::default();
            let raw = format!("https://example.com/p?{blocked}=1&{keep}=2&{blocked}=3");
            let out = canonicalize(&raw, &policy).unwrap();
            let parsed = Url::parse(&out).unwrap();
            prop_assert!(parsed.query_pairs().all(|(k, _)| k != blocked));
            prop_assert!(parsed.query_pairs().any(|(k, _)| k == keep));
        }
    }
}
