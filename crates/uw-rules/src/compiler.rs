//! Rule compilation
//!
//! Compiling a rule document is the once-per-load setup: schemes are
//! lowercased and set-ified, domains are canonicalized and split into label
//! sequences, subdomain specs collapse into a policy, and remove patterns
//! become validated glob predicates. The result is a [`CompiledRuleset`]
//! that is read-only and shared across all subsequent matches.
//!
//! Every violation found anywhere in the document is collected; compilation
//! fails with the full aggregate rather than stopping at the first problem.

use std::collections::HashSet;

use uw_core::glob::Pattern;
use uw_core::host::HostCanonicalizer;

use crate::error::{RulesValidationError, Violation};
use crate::types::{DomainsSpec, RulesDocument, SubdomainsSpec, UrlRule};

// =============================================================================
// Compiled types
// =============================================================================

/// Scheme filter of one compiled rule.
#[derive(Debug, Clone)]
pub(crate) struct SchemeSet {
    /// Whether the rule declared `schemes` itself. Undeclared rules get the
    /// default set and stay "unscoped": they also apply to scheme-less URLs.
    explicit: bool,
    set: HashSet<String>,
}

impl SchemeSet {
    fn default_set() -> Self {
        Self {
            explicit: false,
            set: ["http", "https"].into_iter().map(str::to_string).collect(),
        }
    }

    /// `scheme` must already be lowercased by the caller.
    pub(crate) fn allows(&self, scheme: Option<&str>) -> bool {
        match scheme {
            Some(s) => self.set.contains(s),
            None => !self.explicit,
        }
    }
}

/// Subdomain-depth policy, compiled from [`SubdomainsSpec`].
#[derive(Debug, Clone)]
pub(crate) enum SubdomainPolicy {
    Any,
    NoSubdomain,
    OneOf {
        labels: HashSet<String>,
        /// Set when the declared label list contained an empty string,
        /// which additionally permits the bare domain.
        include_none: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum DomainsMatcher {
    Any,
    /// Canonical dot-separated label sequences, one per configured domain.
    ListOf(Vec<Vec<String>>),
}

/// Compiled host condition: configured domains plus subdomain policy.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    pub(crate) domains: DomainsMatcher,
    pub(crate) subdomains: SubdomainPolicy,
}

/// One rule, compiled. Keeps its original index so match results preserve
/// configuration order, and the source rule for reporting.
#[derive(Debug, Clone)]
pub struct CompiledSiteRule {
    pub index: usize,
    pub rule: UrlRule,
    pub host: HostMatcher,
    pub(crate) schemes: SchemeSet,
    remove: Vec<Pattern>,
}

impl CompiledSiteRule {
    /// The compiled remove-predicates of this rule.
    pub fn remove_patterns(&self) -> &[Pattern] {
        &self.remove
    }

    /// Whether any remove-predicate accepts this decoded parameter name.
    pub fn removes_param(&self, decoded_name: &str) -> bool {
        self.remove.iter().any(|p| p.matches(decoded_name))
    }
}

/// An ordered, immutable set of compiled rules.
///
/// Built once per rule-document load and shared across arbitrarily many
/// parallel evaluations; nothing in it mutates after compilation.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleset {
    rules: Vec<CompiledSiteRule>,
}

impl CompiledRuleset {
    pub fn rules(&self) -> &[CompiledSiteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compile a rule document against the given host canonicalizer.
///
/// Violations are collected across the whole document; any at all fail the
/// compile with the aggregate error.
pub fn compile(
    doc: &RulesDocument,
    canon: &dyn HostCanonicalizer,
) -> Result<CompiledRuleset, RulesValidationError> {
    let mut violations = Vec::new();
    let mut rules = Vec::with_capacity(doc.rules.len());

    for (index, rule) in doc.rules.iter().enumerate() {
        if let Some(compiled) = compile_rule(index, rule, canon, &mut violations) {
            rules.push(compiled);
        }
    }

    if !violations.is_empty() {
        return Err(RulesValidationError { violations });
    }

    log::debug!("compiled {} rules", rules.len());
    Ok(CompiledRuleset { rules })
}

fn compile_rule(
    index: usize,
    rule: &UrlRule,
    canon: &dyn HostCanonicalizer,
    violations: &mut Vec<Violation>,
) -> Option<CompiledSiteRule> {
    let before = violations.len();

    let schemes = compile_schemes(index, rule, violations);
    let host = compile_host(index, rule, canon, violations);
    let remove = compile_remove(index, rule, violations);

    if violations.len() > before {
        return None;
    }

    Some(CompiledSiteRule {
        index,
        rule: rule.clone(),
        host,
        schemes,
        remove,
    })
}

fn compile_schemes(index: usize, rule: &UrlRule, violations: &mut Vec<Violation>) -> SchemeSet {
    match &rule.when.schemes {
        None => SchemeSet::default_set(),
        Some(list) if list.is_empty() => {
            violations.push(Violation::new(
                format!("rules[{index}].when.schemes"),
                "must not be empty when declared",
            ));
            SchemeSet::default_set()
        }
        Some(list) => SchemeSet {
            explicit: true,
            set: list.iter().map(|s| s.to_lowercase()).collect(),
        },
    }
}

fn compile_host(
    index: usize,
    rule: &UrlRule,
    canon: &dyn HostCanonicalizer,
    violations: &mut Vec<Violation>,
) -> HostMatcher {
    let domains = match &rule.when.host.domains {
        DomainsSpec::Any => DomainsMatcher::Any,
        DomainsSpec::ListOf(list) => {
            let mut compiled = Vec::with_capacity(list.len());
            for (j, domain) in list.iter().enumerate() {
                match canon.to_ascii(domain) {
                    Some(canonical) => {
                        let canonical = canonical.strip_suffix('.').unwrap_or(&canonical);
                        compiled.push(canonical.split('.').map(str::to_string).collect());
                    }
                    None => violations.push(Violation::new(
                        format!("rules[{index}].when.host.domains[{j}]"),
                        format!("domain {domain:?} cannot be canonicalized"),
                    )),
                }
            }
            DomainsMatcher::ListOf(compiled)
        }
    };

    let subdomains = match &rule.when.host.subdomains {
        None | Some(SubdomainsSpec::Any) => SubdomainPolicy::Any,
        Some(SubdomainsSpec::NoSubdomain) => SubdomainPolicy::NoSubdomain,
        Some(SubdomainsSpec::OneOf(list)) => {
            // The empty-string entry is a flag, not a label.
            let include_none = list.iter().any(String::is_empty);
            let labels = list
                .iter()
                .filter(|l| !l.is_empty())
                .map(|l| l.to_lowercase())
                .collect();
            SubdomainPolicy::OneOf {
                labels,
                include_none,
            }
        }
    };

    HostMatcher {
        domains,
        subdomains,
    }
}

fn compile_remove(index: usize, rule: &UrlRule, violations: &mut Vec<Violation>) -> Vec<Pattern> {
    if rule.then.remove.is_empty() {
        violations.push(Violation::new(
            format!("rules[{index}].then.remove"),
            "must contain at least one pattern",
        ));
        return Vec::new();
    }

    let mut patterns = Vec::with_capacity(rule.then.remove.len());
    for (j, raw) in rule.then.remove.iter().enumerate() {
        match Pattern::new(raw.clone()) {
            Ok(pattern) => patterns.push(pattern),
            Err(err) => violations.push(Violation::new(
                format!("rules[{index}].then.remove[{j}]"),
                err.to_string(),
            )),
        }
    }
    patterns
}
