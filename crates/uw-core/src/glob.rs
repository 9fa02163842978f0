//! Glob pattern matching
//!
//! The pattern alphabet works over Unicode code points: `*` matches any run
//! of characters (greedy, with backtracking), `?` matches exactly one, and
//! `\` escapes the next character into a literal. Matching is case-sensitive
//! and exact per code point.
//!
//! Validation is a construction-time contract: a [`Pattern`] that exists is
//! well-formed, and nothing re-validates at match time.

// =============================================================================
// Errors
// =============================================================================

/// Error type for pattern validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern is {0} characters long, limit is {MAX_PATTERN_LEN}")]
    TooLong(usize),
    #[error("pattern contains a newline at index {0}")]
    Newline(usize),
    #[error("pattern contains a carriage return at index {0}")]
    CarriageReturn(usize),
    #[error("pattern contains a tab at index {0}")]
    Tab(usize),
    #[error("pattern contains control character U+{code:04X} at index {index}")]
    Control { index: usize, code: u32 },
    #[error("pattern ends with an unescaped backslash")]
    TrailingBackslash,
}

/// Longest accepted pattern, in code points.
pub const MAX_PATTERN_LEN: usize = 256;

// =============================================================================
// Pattern
// =============================================================================

/// A validated glob pattern.
///
/// Construction fails with a specific [`PatternError`]; once built, the
/// value is guaranteed well-formed for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    raw: String,
}

impl Pattern {
    pub fn new(raw: impl Into<String>) -> Result<Self, PatternError> {
        let raw = raw.into();
        require_valid(&raw)?;
        Ok(Self { raw })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match this pattern against a candidate string.
    pub fn matches(&self, candidate: &str) -> bool {
        glob_match(&self.raw, candidate)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check a raw pattern without constructing a [`Pattern`].
pub fn require_valid(pattern: &str) -> Result<(), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }

    let chars: Vec<char> = pattern.chars().collect();
    if chars.len() > MAX_PATTERN_LEN {
        return Err(PatternError::TooLong(chars.len()));
    }

    for (index, &c) in chars.iter().enumerate() {
        if c <= '\u{1F}' || c == '\u{7F}' {
            return Err(match c {
                '\n' => PatternError::Newline(index),
                '\r' => PatternError::CarriageReturn(index),
                '\t' => PatternError::Tab(index),
                c => PatternError::Control {
                    index,
                    code: c as u32,
                },
            });
        }
    }

    // A backslash escapes the following character; walk escape units to see
    // whether the final backslash has one.
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            if i + 1 >= chars.len() {
                return Err(PatternError::TrailingBackslash);
            }
            i += 2;
        } else {
            i += 1;
        }
    }

    Ok(())
}

// =============================================================================
// Matching
// =============================================================================

/// Match `pattern` against `input`.
///
/// Two-pointer scan with a single backtrack checkpoint: `*` records where it
/// was seen and how much input it had consumed; any later mismatch rewinds
/// to just after that `*` with one more input character consumed. When the
/// input is exhausted, whatever pattern remains must be all `*` — a dangling
/// escape or literal can never match empty.
pub fn glob_match(pattern: &str, input: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let inp: Vec<char> = input.chars().collect();

    let mut p = 0;
    let mut i = 0;
    let mut star_at: Option<usize> = None;
    let mut mark = 0;

    while i < inp.len() {
        if p < pat.len() {
            let c = pat[p];
            if c == '*' {
                // Record (or overwrite) the checkpoint; consume no input.
                star_at = Some(p);
                mark = i;
                p += 1;
                continue;
            }
            let stepped = if c == '\\' {
                // The two-character escape unit must match exactly. A
                // dangling `\` at the end of the pattern matches nothing.
                if p + 1 < pat.len() && pat[p + 1] == inp[i] {
                    p += 2;
                    i += 1;
                    true
                } else {
                    false
                }
            } else if c == '?' || c == inp[i] {
                p += 1;
                i += 1;
                true
            } else {
                false
            };
            if stepped {
                continue;
            }
        }

        match star_at {
            Some(sp) => {
                mark += 1;
                i = mark;
                p = sp + 1;
            }
            None => return false,
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}
