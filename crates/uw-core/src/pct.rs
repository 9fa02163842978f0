//! Percent codec
//!
//! Byte-level percent decoding and encoding. Decoding is total: it never
//! fails, and anything it cannot interpret passes through literally. This
//! matters because query strings in the wild carry stray `%` characters
//! that are not escapes at all.

// =============================================================================
// Decoding
// =============================================================================

/// Decode `%XX` escapes in `raw`, best-effort.
///
/// Contiguous runs of valid percent-triplets are collected as raw bytes and
/// decoded as UTF-8 as a unit, so multi-byte sequences like `%E2%82%AC`
/// come out as a single `€`. A run that is not valid UTF-8 decodes with
/// U+FFFD replacement. An invalid or incomplete escape (bad hex digits, a
/// truncated triplet, a lone trailing `%`) emits its `%` literally and
/// scanning continues, so `%GZ` stays `%GZ`.
pub fn decode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);

        // Collect the maximal run of valid triplets starting here.
        let bytes = rest.as_bytes();
        let mut j = pos;
        let mut run: Vec<u8> = Vec::new();
        while j < bytes.len() && bytes[j] == b'%' {
            let hi = bytes.get(j + 1).copied().and_then(hex_val);
            let lo = bytes.get(j + 2).copied().and_then(hex_val);
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    run.push((hi << 4) | lo);
                    j += 3;
                }
                _ => break,
            }
        }

        if run.is_empty() {
            // Not an escape at all; keep the `%` and move on.
            out.push('%');
            rest = &rest[pos + 1..];
        } else {
            out.push_str(&String::from_utf8_lossy(&run));
            rest = &rest[j..];
        }
    }

    out.push_str(rest);
    out
}

#[inline]
fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// RFC 3986 unreserved characters pass through; everything else is escaped.
#[inline]
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Percent-encode every byte of `s` outside the unreserved set.
///
/// Uppercase hex digits. Inverse of [`decode`] for any valid UTF-8 input.
pub fn encode(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}
