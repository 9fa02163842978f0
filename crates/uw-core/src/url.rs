//! Structured URL representation
//!
//! [`UrlParts`] splits a URL string into scheme, authority, path, query and
//! fragment without interpreting any of them. The guiding invariant is the
//! lossless round trip: `to_url_string()` reproduces the input byte for
//! byte, including default ports and empty fragments. The port is the one
//! component held numerically, so non-canonical port text (`:0080`) comes
//! back normalized (`:80`).

use crate::query::QueryPairs;

// =============================================================================
// Errors
// =============================================================================

/// Error type for URL splitting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUrl {
    #[error("unclosed '[' in authority")]
    UnclosedBracket,
    #[error("invalid port: {0:?}")]
    InvalidPort(String),
}

// =============================================================================
// UrlParts
// =============================================================================

/// A URL split into its components.
///
/// Immutable by convention: structural updates go through [`UrlParts::with_query`],
/// which produces a new value. All string components are kept exactly as
/// they appeared; nothing is decoded or normalized here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub user_info: Option<String>,
    pub host: Option<String>,
    /// Stored numerically: losslessness assumes canonical decimal port
    /// text, so `:0080` re-serializes as `:80`.
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: QueryPairs,
    pub fragment: Option<String>,
}

impl UrlParts {
    /// Split a raw URL string into parts.
    ///
    /// The splitter is permissive about content and strict about structure:
    /// an unclosed `[` in the authority or a non-numeric port fails with
    /// [`InvalidUrl`], everything else lands in some component. Inputs
    /// without `scheme://` parse as scheme-less path + query + fragment.
    pub fn parse(raw: &str) -> Result<Self, InvalidUrl> {
        // Fragment first, then query, so a `://` inside either cannot be
        // mistaken for a scheme separator.
        let (before_fragment, fragment) = match raw.split_once('#') {
            Some((head, frag)) => (head, Some(frag.to_string())),
            None => (raw, None),
        };
        let (base, query) = match before_fragment.split_once('?') {
            Some((head, q)) => (head, QueryPairs::parse(q)),
            None => (before_fragment, QueryPairs::default()),
        };

        let (scheme, after_scheme) = split_scheme(base);

        let (user_info, host, port, path) = match scheme {
            Some(_) => {
                // Authority runs to the first `/`.
                let (authority, path) = match after_scheme.find('/') {
                    Some(slash) => (&after_scheme[..slash], &after_scheme[slash..]),
                    None => (after_scheme, ""),
                };
                let (user_info, host, port) = split_authority(authority)?;
                (user_info, host, port, path)
            }
            None => (None, None, None, after_scheme),
        };

        Ok(Self {
            scheme: scheme.map(str::to_string),
            user_info,
            host,
            port,
            path: if path.is_empty() {
                None
            } else {
                Some(path.to_string())
            },
            query,
            fragment,
        })
    }

    /// Replace the query pairs, producing a new value.
    pub fn with_query(&self, query: QueryPairs) -> Self {
        Self {
            query,
            ..self.clone()
        }
    }

    /// Faithful reconstruction of the URL string.
    ///
    /// The port is always rendered when present, never inferred or omitted,
    /// so `https://example.com:443/` survives unchanged. An IPv6 host
    /// (contains `:`, not already wrapped in a matching bracket pair) is
    /// wrapped in `[` `]`; zone identifiers must already be `%25`-encoded
    /// by whoever built the parts.
    pub fn to_url_string(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push_str("://");
        }
        if let Some(user_info) = &self.user_info {
            out.push_str(user_info);
            out.push('@');
        }
        if let Some(host) = &self.host {
            if needs_brackets(host) {
                out.push('[');
                out.push_str(host);
                out.push(']');
            } else {
                out.push_str(host);
            }
        }
        if let Some(port) = self.port {
            out.push(':');
            out.push_str(&port.to_string());
        }
        if let Some(path) = &self.path {
            out.push_str(path);
        }
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query.serialize());
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

// =============================================================================
// Splitting helpers
// =============================================================================

/// Detect a leading `scheme://`. Returns the scheme and the remainder after
/// `://`, or `(None, input)` when the input does not start with one.
fn split_scheme(base: &str) -> (Option<&str>, &str) {
    let bytes = base.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_alphabetic() {
        return (None, base);
    }
    let mut end = 1;
    while end < bytes.len() && is_scheme_byte(bytes[end]) {
        end += 1;
    }
    if base[end..].starts_with("://") {
        (Some(&base[..end]), &base[end + 3..])
    } else {
        (None, base)
    }
}

#[inline]
fn is_scheme_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')
}

type Authority = (Option<String>, Option<String>, Option<u16>);

/// Split `userinfo@host:port`. A bracketed IPv6 host keeps its brackets.
fn split_authority(authority: &str) -> Result<Authority, InvalidUrl> {
    if authority.is_empty() {
        return Ok((None, None, None));
    }

    let (user_info, host_port) = match authority.find('@') {
        Some(at) => (Some(authority[..at].to_string()), &authority[at + 1..]),
        None => (None, authority),
    };

    let (host, port_str) = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(close) => {
                let host = &host_port[..=close];
                match host_port[close + 1..].strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => (host, None),
                }
            }
            None => return Err(InvalidUrl::UnclosedBracket),
        }
    } else {
        match host_port.rfind(':') {
            Some(colon) => (&host_port[..colon], Some(&host_port[colon + 1..])),
            None => (host_port, None),
        }
    };

    let port = match port_str {
        Some(p) => Some(
            p.parse::<u16>()
                .map_err(|_| InvalidUrl::InvalidPort(p.to_string()))?,
        ),
        None => None,
    };

    Ok((user_info, Some(host.to_string()), port))
}

/// IPv6 detection for serialization: contains `:` and is not already wrapped
/// in a matching bracket pair. Malformed partial bracketing gets wrapped too.
#[inline]
fn needs_brackets(host: &str) -> bool {
    host.contains(':') && !(host.starts_with('[') && host.ends_with(']'))
}
