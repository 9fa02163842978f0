//! Host canonicalization
//!
//! Rule domains and URL hosts both go through the same canonicalization
//! before comparison: Unicode full stops unified, trailing dots handled,
//! lowercased, validated, then IDNA-converted to ASCII labels. The IDNA
//! step itself comes from the `idna` crate; everything around it is our
//! validation envelope, and the steps run in a fixed order because later
//! ones assume the earlier normalization already happened.

use idna::domain_to_ascii;

/// Turns a raw host into canonical ASCII labels, or `None` when the host is
/// unusable. Injected explicitly wherever canonicalization is needed, so
/// tests can substitute their own.
pub trait HostCanonicalizer {
    fn to_ascii(&self, raw: &str) -> Option<String>;
}

/// The production canonicalizer, backed by `idna::domain_to_ascii`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdnaCanonicalizer;

impl HostCanonicalizer for IdnaCanonicalizer {
    fn to_ascii(&self, raw: &str) -> Option<String> {
        // (1) Unify the ideographic/fullwidth full stops to ASCII dots.
        let unified: String = raw
            .chars()
            .map(|c| match c {
                '\u{3002}' | '\u{FF0E}' | '\u{FF61}' => '.',
                c => c,
            })
            .collect();

        // (2) Trailing-dot policy: 4 or more collapse to exactly one,
        // fewer are stripped entirely.
        let trailing = unified.chars().rev().take_while(|&c| c == '.').count();
        let mut host = unified[..unified.len() - trailing].to_string();
        if trailing >= 4 {
            host.push('.');
        }

        // (3) Case-fold before any structural checks.
        let host = host.to_lowercase();

        // (4) Structural rejections.
        if host.is_empty() && unified.starts_with('.') {
            return None;
        }
        if host.contains("..")
            || host.chars().any(char::is_whitespace)
            || host.chars().any(|c| matches!(c, '@' | '#' | '$' | '%'))
        {
            return None;
        }

        // (5) No label may start or end with a hyphen.
        if host
            .split('.')
            .any(|label| label.starts_with('-') || label.ends_with('-'))
        {
            return None;
        }

        // (6) Punycode conversion.
        let ascii = domain_to_ascii(&host).ok()?;

        // (7) The IDNA result gets its own sanity check.
        if ascii.is_empty() || ascii.contains("..") || ascii.starts_with('.') {
            return None;
        }

        Some(ascii)
    }
}
