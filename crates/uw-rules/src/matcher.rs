//! Ruleset evaluation
//!
//! The hot path: given a parsed URL and a compiled ruleset, find every rule
//! whose scheme set and host matcher accept it (all of them, in original
//! configuration order — removal downstream unions the predicates of every
//! match), then filter the query tokens whose decoded names any matched
//! rule wants removed. Everything here is a pure function over immutable
//! inputs.

use uw_core::host::HostCanonicalizer;
use uw_core::query::QueryToken;
use uw_core::url::UrlParts;

use crate::compiler::{CompiledRuleset, CompiledSiteRule, DomainsMatcher, HostMatcher, SubdomainPolicy};
use crate::types::WarnBlock;

// =============================================================================
// Host matching
// =============================================================================

impl HostMatcher {
    /// Match a raw host against this compiled condition.
    ///
    /// The host goes through the same canonicalization as configured
    /// domains; an empty or uncanonicalizable host never matches, not even
    /// under `Domains::Any`.
    pub fn matches(&self, raw_host: &str, canon: &dyn HostCanonicalizer) -> bool {
        let canonical = match canon.to_ascii(raw_host) {
            Some(c) => c,
            None => return false,
        };
        // Same post-step as compiled domains: a canonical form may keep one
        // trailing dot, which must not produce a trailing empty label.
        let canonical = canonical.strip_suffix('.').unwrap_or(&canonical);
        if canonical.is_empty() {
            return false;
        }

        match &self.domains {
            DomainsMatcher::Any => true,
            DomainsMatcher::ListOf(domains) => {
                let host_labels: Vec<&str> = canonical.split('.').collect();
                // Logical OR over configured domains; the first to satisfy
                // both the suffix and the subdomain policy wins.
                domains
                    .iter()
                    .any(|domain| self.suffix_matches(&host_labels, domain))
            }
        }
    }

    /// Suffix-label comparison plus subdomain-depth policy.
    ///
    /// The configured domain's labels must equal the trailing labels of the
    /// host; the leading remainder is the subdomain depth `k`.
    fn suffix_matches(&self, host_labels: &[&str], domain_labels: &[String]) -> bool {
        if host_labels.len() < domain_labels.len() {
            return false;
        }
        let k = host_labels.len() - domain_labels.len();
        let suffix_equal = host_labels[k..]
            .iter()
            .zip(domain_labels)
            .all(|(host, domain)| *host == domain);
        if !suffix_equal {
            return false;
        }

        match &self.subdomains {
            SubdomainPolicy::Any => true,
            SubdomainPolicy::NoSubdomain => k == 0,
            SubdomainPolicy::OneOf {
                labels,
                include_none,
            } => match k {
                0 => *include_none,
                1 => labels.contains(host_labels[0]),
                // Multi-level subdomains only pass under Any.
                _ => false,
            },
        }
    }
}

// =============================================================================
// Ruleset evaluation
// =============================================================================

impl CompiledRuleset {
    /// Every compiled rule matching the URL, in original configuration
    /// order. Not first-match-wins: callers union the remove-predicates and
    /// warning settings of all matches.
    pub fn find_matches<'a>(
        &'a self,
        url: &UrlParts,
        canon: &dyn HostCanonicalizer,
    ) -> Vec<&'a CompiledSiteRule> {
        let scheme = url.scheme.as_deref().map(str::to_lowercase);
        let host = url.host.as_deref().unwrap_or("");

        self.rules()
            .iter()
            .filter(|rule| rule.schemes.allows(scheme.as_deref()) && rule.host.matches(host, canon))
            .collect()
    }
}

// =============================================================================
// Cleaning
// =============================================================================

/// Result of cleaning one URL against a ruleset.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// The URL with matched parameters removed (unchanged when nothing
    /// matched or nothing was removable).
    pub url: UrlParts,
    /// Tokens removed, in original appearance order.
    pub removed: Vec<QueryToken>,
    /// Indices of the rules that matched, in configuration order.
    pub matched: Vec<usize>,
    /// Warning configs of matched rules that declared one.
    pub warnings: Vec<WarnBlock>,
}

impl CleanOutcome {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Clean a URL: union the remove-predicates of every matching rule and drop
/// each query token whose decoded key any of them accepts.
pub fn clean(url: &UrlParts, ruleset: &CompiledRuleset, canon: &dyn HostCanonicalizer) -> CleanOutcome {
    let matches = ruleset.find_matches(url, canon);

    if matches.is_empty() || url.query.is_empty() {
        return CleanOutcome {
            url: url.clone(),
            removed: Vec::new(),
            matched: matches.iter().map(|r| r.index).collect(),
            warnings: collect_warnings(&matches),
        };
    }

    let mut kept: Vec<QueryToken> = Vec::with_capacity(url.query.len());
    let mut removed: Vec<QueryToken> = Vec::new();
    for token in &url.query {
        let name = token.decoded_key();
        if matches.iter().any(|rule| rule.removes_param(name)) {
            removed.push(token.clone());
        } else {
            kept.push(token.clone());
        }
    }

    if removed.is_empty() {
        log::debug!("{} rule(s) matched, nothing to remove", matches.len());
    }

    let url = if removed.is_empty() {
        url.clone()
    } else {
        url.with_query(kept.into())
    };

    CleanOutcome {
        url,
        removed,
        matched: matches.iter().map(|r| r.index).collect(),
        warnings: collect_warnings(&matches),
    }
}

fn collect_warnings(matches: &[&CompiledSiteRule]) -> Vec<WarnBlock> {
    matches
        .iter()
        .filter_map(|rule| rule.rule.then.warn.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uw_core::host::IdnaCanonicalizer;

    use crate::compiler::compile;
    use crate::types::RulesDocument;

    fn ruleset(json: &str) -> CompiledRuleset {
        let doc: RulesDocument = serde_json::from_str(json).unwrap();
        compile(&doc, &IdnaCanonicalizer).unwrap()
    }

    fn url(raw: &str) -> UrlParts {
        UrlParts::parse(raw).unwrap()
    }

    const CANON: IdnaCanonicalizer = IdnaCanonicalizer;

    #[test]
    fn test_no_subdomain_policy() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["example.com"], "subdomains": "none"}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        assert!(host.matches("example.com", &CANON));
        assert!(host.matches("EXAMPLE.COM", &CANON));
        assert!(!host.matches("www.example.com", &CANON));
        assert!(!host.matches("example.org", &CANON));
        assert!(!host.matches("notexample.com", &CANON));
    }

    #[test]
    fn test_oneof_policy_with_none_flag() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["example.com"], "subdomains": ["www", ""]}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        assert!(host.matches("example.com", &CANON));
        assert!(host.matches("www.example.com", &CANON));
        assert!(!host.matches("m.example.com", &CANON));
        assert!(!host.matches("api.www.example.com", &CANON));
    }

    #[test]
    fn test_oneof_policy_without_none_flag() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["example.com"], "subdomains": ["www"]}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        assert!(!host.matches("example.com", &CANON));
        assert!(host.matches("www.example.com", &CANON));
    }

    #[test]
    fn test_any_subdomain_policy() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["example.com"], "subdomains": "*"}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        assert!(host.matches("example.com", &CANON));
        assert!(host.matches("deep.sub.example.com", &CANON));
        assert!(!host.matches("example.com.evil.org", &CANON));
    }

    #[test]
    fn test_trailing_dot_hosts_match_like_their_domains() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["example.com"], "subdomains": "*"}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        // Fewer than 4 trailing dots strip entirely during canonicalization.
        assert!(host.matches("example.com.", &CANON));
        assert!(host.matches("www.example.com...", &CANON));
        // 4 or more collapse to one trailing dot, which gets the same
        // post-canonicalization strip as configured domains.
        assert!(host.matches("example.com....", &CANON));
        assert!(host.matches("www.example.com....", &CANON));
        // A host that is nothing but dots still never matches.
        let any = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["x"]}}
        ]}"#);
        assert!(!any.rules()[0].host.matches("....", &CANON));
    }

    #[test]
    fn test_domain_list_is_logical_or() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["a.com", "b.org"]}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        assert!(host.matches("a.com", &CANON));
        assert!(host.matches("sub.b.org", &CANON));
        assert!(!host.matches("c.net", &CANON));
    }

    #[test]
    fn test_invalid_host_never_matches() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["x"]}}
        ]}"#);
        let host = &rs.rules()[0].host;
        assert!(!host.matches("", &CANON));
        assert!(!host.matches("bad host", &CANON));
        assert!(host.matches("good.example", &CANON));
    }

    #[test]
    fn test_find_matches_scheme_filter() {
        let rs = ruleset(r#"{"rules": [
            {"name": "https-only", "when": {"host": {"domains": "*"}, "schemes": ["https"]}, "then": {"remove": ["x"]}},
            {"name": "default", "when": {"host": {"domains": "*"}}, "then": {"remove": ["y"]}}
        ]}"#);

        let both = rs.find_matches(&url("https://example.com/"), &CANON);
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].index, 0);
        assert_eq!(both[1].index, 1);

        // Scheme compare is case-insensitive on the URL side.
        let upper = rs.find_matches(&url("HTTPS://example.com/"), &CANON);
        assert_eq!(upper.len(), 2);

        let http = rs.find_matches(&url("http://example.com/"), &CANON);
        assert_eq!(http.len(), 1);
        assert_eq!(http[0].index, 1);
    }

    #[test]
    fn test_find_matches_returns_all_in_order() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["example.com"], "subdomains": "*"}}, "then": {"remove": ["a"]}},
            {"when": {"host": {"domains": ["other.org"]}}, "then": {"remove": ["b"]}},
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["c"]}}
        ]}"#);
        let matched = rs.find_matches(&url("https://www.example.com/"), &CANON);
        let indices: Vec<usize> = matched.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 2]);
    }

    #[test]
    fn test_tracking_scenario() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["twitter.com"], "subdomains": "*"}, "schemes": ["https"]},
             "then": {"remove": ["utm_*", "fbclid"]}}
        ]}"#);

        let parsed = url("https://mobile.twitter.com/x?utm_source=a&fbclid=1&id=7");
        let matched = rs.find_matches(&parsed, &CANON);
        assert_eq!(matched.len(), 1);

        let rule = matched[0];
        assert!(rule.removes_param("utm_source"));
        assert!(rule.removes_param("fbclid"));
        assert!(!rule.removes_param("id"));

        let outcome = clean(&parsed, &rs, &CANON);
        assert!(outcome.changed());
        assert_eq!(outcome.url.to_url_string(), "https://mobile.twitter.com/x?id=7");
        let removed: Vec<&str> = outcome.removed.iter().map(|t| t.raw_key()).collect();
        assert_eq!(removed, ["utm_source", "fbclid"]);
    }

    #[test]
    fn test_clean_unions_matched_rules() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["utm_*"], "warn": {"message": "utm"}}},
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["gclid"]}}
        ]}"#);
        let outcome = clean(
            &url("https://shop.example/p?utm_medium=mail&gclid=g&keep=1"),
            &rs,
            &CANON,
        );
        assert_eq!(outcome.matched, [0, 1]);
        assert_eq!(outcome.url.to_url_string(), "https://shop.example/p?keep=1");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].message.as_deref(), Some("utm"));
    }

    #[test]
    fn test_clean_matches_decoded_keys_but_keeps_raw_form() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["utm_source"]}}
        ]}"#);
        // `ut%6D_source` decodes to `utm_source`; the kept token stays raw.
        let outcome = clean(
            &url("https://example.com/?ut%6D_source=x&ke%2Fep=1"),
            &rs,
            &CANON,
        );
        assert_eq!(outcome.url.to_url_string(), "https://example.com/?ke%2Fep=1");
    }

    #[test]
    fn test_clean_without_match_is_identity() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": ["other.org"]}}, "then": {"remove": ["utm_*"]}}
        ]}"#);
        let parsed = url("https://example.com/?utm_source=x");
        let outcome = clean(&parsed, &rs, &CANON);
        assert!(!outcome.changed());
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.url, parsed);
    }

    #[test]
    fn test_scheme_less_url_matches_only_unscoped_rules() {
        let rs = ruleset(r#"{"rules": [
            {"when": {"host": {"domains": "*"}, "schemes": ["https"]}, "then": {"remove": ["x"]}},
            {"when": {"host": {"domains": "*"}}, "then": {"remove": ["y"]}}
        ]}"#);
        // No scheme at all: host is absent too, so nothing matches.
        let bare = url("example.com/path");
        assert!(rs.find_matches(&bare, &CANON).is_empty());

        // A scheme-less URL with a host only comes from parts built by the
        // caller.
        let mut parts = url("https://example.com/path");
        parts.scheme = None;
        let matched = rs.find_matches(&parts, &CANON);
        let indices: Vec<usize> = matched.iter().map(|r| r.index).collect();
        assert_eq!(indices, [1]);
    }
}
