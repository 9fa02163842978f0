//! urlwash Core Library
//!
//! This crate provides the building blocks for the urlwash tracking-parameter
//! cleaner: a lossless URL/query model, a best-effort percent codec, a glob
//! pattern engine and a host canonicalizer. Everything here is a pure
//! function over immutable values; a parsed [`UrlParts`] or a validated
//! [`Pattern`] can be shared across threads and evaluated concurrently
//! without locking.
//!
//! # Modules
//!
//! - `pct`: percent decode/encode with UTF-8 aware, never-failing decoding
//! - `query`: lossless query-parameter tokens with memoized decoding
//! - `url`: structured URL representation and faithful re-serialization
//! - `host`: canonicalization of raw hosts to ASCII (IDNA) labels
//! - `glob`: `*`/`?`/`\` wildcard matching over decoded strings

pub mod glob;
pub mod host;
pub mod pct;
pub mod query;
pub mod url;

// Re-export commonly used types
pub use glob::{glob_match, Pattern, PatternError};
pub use host::{HostCanonicalizer, IdnaCanonicalizer};
pub use query::{QueryPairs, QueryToken};
pub use url::{InvalidUrl, UrlParts};
