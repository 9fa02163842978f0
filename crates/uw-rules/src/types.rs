//! Rule document model
//!
//! These types mirror the JSON rule documents the host application ships:
//! a list of rules, each with a `when` block (host condition, schemes) and
//! a `then` block (remove patterns, optional warning config). The sum
//! types are closed enums; everything consuming them matches exhaustively.
//!
//! Deserialization accepts the document shapes as authored: `domains` is
//! `"*"` or a list of domain strings, `subdomains` is `"*"`, `"none"` or a
//! list of labels where an empty string additionally permits "no
//! subdomain".

use serde::Deserialize;

// =============================================================================
// Host condition
// =============================================================================

/// Which registrable domains a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DomainsRepr")]
pub enum DomainsSpec {
    /// Any host at all.
    Any,
    /// One of the listed domains (suffix-label match).
    ListOf(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DomainsRepr {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<DomainsRepr> for DomainsSpec {
    type Error = String;

    fn try_from(repr: DomainsRepr) -> Result<Self, Self::Error> {
        match repr {
            DomainsRepr::One(s) if s == "*" => Ok(Self::Any),
            DomainsRepr::One(s) => Err(format!(
                "domains must be \"*\" or a list of domains, got {s:?}"
            )),
            DomainsRepr::Many(list) => Ok(Self::ListOf(list)),
        }
    }
}

/// Which subdomain depths a rule accepts, relative to the matched domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SubdomainsRepr")]
pub enum SubdomainsSpec {
    /// Any subdomain, including none.
    Any,
    /// Only the bare domain itself.
    NoSubdomain,
    /// Exactly one of the listed leading labels; an empty-string entry
    /// additionally permits the bare domain.
    OneOf(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubdomainsRepr {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<SubdomainsRepr> for SubdomainsSpec {
    type Error = String;

    fn try_from(repr: SubdomainsRepr) -> Result<Self, Self::Error> {
        match repr {
            SubdomainsRepr::One(s) if s == "*" => Ok(Self::Any),
            SubdomainsRepr::One(s) if s == "none" => Ok(Self::NoSubdomain),
            SubdomainsRepr::One(s) => Err(format!(
                "subdomains must be \"*\", \"none\" or a list of labels, got {s:?}"
            )),
            SubdomainsRepr::Many(list) => Ok(Self::OneOf(list)),
        }
    }
}

/// Host condition of a rule's `when` block.
///
/// `subdomains` is meaningful only when `domains` is a list; the external
/// schema owns that invariant and this crate does not re-validate it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostCond {
    pub domains: DomainsSpec,
    #[serde(default)]
    pub subdomains: Option<SubdomainsSpec>,
}

// =============================================================================
// Rule blocks
// =============================================================================

/// Conditions under which a rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WhenBlock {
    pub host: HostCond,
    /// Absent means the default `{http, https}` and leaves the rule
    /// "unscoped" (it also applies to scheme-less URLs).
    #[serde(default)]
    pub schemes: Option<Vec<String>>,
}

/// Per-rule warning configuration, passed through to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WarnBlock {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Actions of a matched rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThenBlock {
    /// Glob patterns over decoded parameter names. Must be non-empty.
    pub remove: Vec<String>,
    #[serde(default)]
    pub warn: Option<WarnBlock>,
}

/// One declarative cleaning rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub when: WhenBlock,
    pub then: ThenBlock,
}

fn default_version() -> u32 {
    1
}

/// A full rule document as supplied by the rule document source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RulesDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub rules: Vec<UrlRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains_repr() {
        let any: DomainsSpec = serde_json::from_str("\"*\"").unwrap();
        assert_eq!(any, DomainsSpec::Any);

        let list: DomainsSpec = serde_json::from_str(r#"["a.com","b.org"]"#).unwrap();
        assert_eq!(
            list,
            DomainsSpec::ListOf(vec!["a.com".to_string(), "b.org".to_string()])
        );

        assert!(serde_json::from_str::<DomainsSpec>("\"a.com\"").is_err());
    }

    #[test]
    fn test_subdomains_repr() {
        assert_eq!(
            serde_json::from_str::<SubdomainsSpec>("\"*\"").unwrap(),
            SubdomainsSpec::Any
        );
        assert_eq!(
            serde_json::from_str::<SubdomainsSpec>("\"none\"").unwrap(),
            SubdomainsSpec::NoSubdomain
        );
        assert_eq!(
            serde_json::from_str::<SubdomainsSpec>(r#"["www",""]"#).unwrap(),
            SubdomainsSpec::OneOf(vec!["www".to_string(), String::new()])
        );
        assert!(serde_json::from_str::<SubdomainsSpec>("\"all\"").is_err());
    }

    #[test]
    fn test_rule_document() {
        let doc: RulesDocument = serde_json::from_str(
            r#"{
                "rules": [
                    {
                        "name": "twitter",
                        "when": {
                            "host": {"domains": ["twitter.com"], "subdomains": "*"},
                            "schemes": ["https"]
                        },
                        "then": {"remove": ["utm_*", "fbclid"], "warn": {"message": "tracker"}}
                    },
                    {
                        "when": {"host": {"domains": "*"}},
                        "then": {"remove": ["gclid"]}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.version, 1);
        assert_eq!(doc.rules.len(), 2);
        assert_eq!(doc.rules[0].name.as_deref(), Some("twitter"));
        assert_eq!(doc.rules[0].version, 1);
        assert!(doc.rules[0].then.warn.as_ref().unwrap().enabled);
        assert_eq!(doc.rules[1].when.schemes, None);
        assert_eq!(doc.rules[1].when.host.domains, DomainsSpec::Any);
        assert_eq!(doc.rules[1].when.host.subdomains, None);
    }
}
