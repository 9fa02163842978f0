//! Lossless query-parameter model
//!
//! A query string is kept as the ordered sequence of its raw `key=value`
//! tokens. Nothing is decoded up front: decoding happens lazily, per token,
//! and the raw form is always reconstructible byte for byte. A bare flag
//! (`foo`) and an empty assignment (`foo=`) are different tokens and stay
//! different.

use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::pct;

// =============================================================================
// QueryToken
// =============================================================================

/// One query parameter as it appeared in the URL.
///
/// Immutable. The decoded key/value are computed on first access through the
/// percent codec and cached; concurrent first accesses may race to compute
/// the same deterministic value, which `OnceLock` resolves without blocking
/// readers.
#[derive(Debug, Clone)]
pub struct QueryToken {
    raw_key: String,
    has_equals: bool,
    raw_value: String,
    decoded_key: OnceLock<String>,
    decoded_value: OnceLock<String>,
}

impl QueryToken {
    /// Build a token from its raw parts.
    pub fn new(raw_key: impl Into<String>, has_equals: bool, raw_value: impl Into<String>) -> Self {
        Self {
            raw_key: raw_key.into(),
            has_equals,
            raw_value: raw_value.into(),
            decoded_key: OnceLock::new(),
            decoded_value: OnceLock::new(),
        }
    }

    /// Parse one `key[=value]` segment, splitting at the first `=`.
    pub fn parse(pair: &str) -> Self {
        match pair.split_once('=') {
            Some((key, value)) => Self::new(key, true, value),
            None => Self::new(pair, false, ""),
        }
    }

    /// The key exactly as it appeared (still percent-encoded).
    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// Whether the original segment contained an `=`.
    pub fn has_equals(&self) -> bool {
        self.has_equals
    }

    /// The value exactly as it appeared (still percent-encoded).
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Percent-decoded key, memoized on first access.
    pub fn decoded_key(&self) -> &str {
        self.decoded_key.get_or_init(|| pct::decode(&self.raw_key))
    }

    /// Percent-decoded value, memoized on first access.
    pub fn decoded_value(&self) -> &str {
        self.decoded_value
            .get_or_init(|| pct::decode(&self.raw_value))
    }

    /// Reconstruct the exact original segment.
    ///
    /// Never touches the decoded caches: `key`, then `=` iff the original
    /// had one, then `value`.
    pub fn as_string(&self) -> String {
        let mut out = String::with_capacity(self.raw_key.len() + 1 + self.raw_value.len());
        out.push_str(&self.raw_key);
        if self.has_equals {
            out.push('=');
        }
        out.push_str(&self.raw_value);
        out
    }
}

// Equality is over the raw parts only; the memoized caches are derived.
impl PartialEq for QueryToken {
    fn eq(&self, other: &Self) -> bool {
        self.raw_key == other.raw_key
            && self.has_equals == other.has_equals
            && self.raw_value == other.raw_value
    }
}

impl Eq for QueryToken {}

// =============================================================================
// QueryPairs
// =============================================================================

/// Ordered sequence of query tokens.
///
/// Insertion order is appearance order; duplicate keys are permitted and
/// preserved. An absent query is the empty sequence; a present-but-empty
/// query (`…?`) is one empty token, so serialization stays lossless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs {
    tokens: Vec<QueryToken>,
}

impl QueryPairs {
    /// Split a raw query string on `&`.
    ///
    /// Empty segments (from `a&&b` or a trailing `&`) are kept as empty
    /// tokens; dropping them would break round-tripping.
    pub fn parse(query: &str) -> Self {
        Self {
            tokens: query.split('&').map(QueryToken::parse).collect(),
        }
    }

    pub fn tokens(&self) -> &[QueryToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryToken> {
        self.tokens.iter()
    }

    /// Rebuild the raw query string, byte for byte.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&token.as_string());
        }
        out
    }

    /// Grouped view: decoded key to the ordered tokens sharing that key.
    ///
    /// Keys appear in order of first appearance; tokens within a group keep
    /// their relative order.
    pub fn group_by_decoded_key(&self) -> IndexMap<String, Vec<&QueryToken>> {
        let mut map: IndexMap<String, Vec<&QueryToken>> = IndexMap::new();
        for token in &self.tokens {
            map.entry(token.decoded_key().to_string())
                .or_default()
                .push(token);
        }
        map
    }
}

impl From<Vec<QueryToken>> for QueryPairs {
    fn from(tokens: Vec<QueryToken>) -> Self {
        Self { tokens }
    }
}

impl<'a> IntoIterator for &'a QueryPairs {
    type Item = &'a QueryToken;
    type IntoIter = std::slice::Iter<'a, QueryToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
