//! Validation errors
//!
//! Two shapes for the configuration channel: a single offending field path
//! ([`AppValidationError`]) and an aggregate of every violation found in a
//! document ([`RulesValidationError`]). Rule compilation reports the
//! aggregate so a document author sees all problems at once.

use std::fmt;

/// A configuration value at `path` failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct AppValidationError {
    pub path: String,
    pub message: String,
}

/// One violation inside a rule document, located by field path
/// (e.g. `rules[2].then.remove[0]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregate of every violation found while compiling a rule document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for RulesValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rule validation problem(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RulesValidationError {}

impl From<AppValidationError> for RulesValidationError {
    fn from(err: AppValidationError) -> Self {
        Self {
            violations: vec![Violation::new(err.path, err.message)],
        }
    }
}
