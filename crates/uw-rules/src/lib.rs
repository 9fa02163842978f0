//! urlwash Rule Compiler and Matcher
//!
//! This crate turns declarative host/scheme/remove-pattern rules into a
//! [`CompiledRuleset`] and evaluates URLs against it. Compiling is the
//! amortized setup done once per rule-document load; matching and cleaning
//! are the hot, side-effect-free path, safe to run concurrently against a
//! shared ruleset.

pub mod compiler;
pub mod error;
pub mod matcher;
pub mod types;

pub use compiler::{compile, CompiledRuleset, CompiledSiteRule, HostMatcher};
pub use error::{AppValidationError, RulesValidationError, Violation};
pub use matcher::{clean, CleanOutcome};
pub use types::{
    DomainsSpec, HostCond, RulesDocument, SubdomainsSpec, ThenBlock, UrlRule, WarnBlock, WhenBlock,
};
