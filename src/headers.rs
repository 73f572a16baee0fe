//! Case-insensitive HTTP header storage with comma-folding, plus an
//! incremental line parser that consumes one header line at a time from a
//! byte buffer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ParseError;

/// `tchar` — characters allowed in HTTP tokens (field names).
///
/// ```text
/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
/// ```
#[inline]
fn is_tchar(b: u8) -> bool {
    b < 128
        && matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
                | b'0'..=b'9'
                | b'a'..=b'z'
                | b'A'..=b'Z'
        )
}

/// A case-insensitive header set. Keys are stored lowercased; repeated
/// keys are folded into a single comma-space-joined value in arrival
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers {
    inner: BTreeMap<String, String>,
}

impl Headers {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one header line (terminated by CRLF) from the unconsumed
    /// remainder of the inbound stream.
    ///
    /// Returns `(consumed, done)`:
    /// - `(0, false)` if `buf` contains no CRLF — caller must supply more bytes.
    /// - `(2, true)` if `buf` begins with CRLF — the blank-line terminator.
    /// - `(line_len + 2, false)` after folding one header line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedHeader`] if the line has no colon or
    /// has whitespace between the field name and the colon, and
    /// [`ParseError::IllegalFieldNameChar`] if the field name contains a
    /// byte outside the token set.
    pub fn parse(&mut self, buf: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(idx) = find_crlf(buf) else {
            return Ok((0, false));
        };
        if idx == 0 {
            return Ok((2, true));
        }

        let consumed = idx + 2;
        let line = trim_ows(&buf[..idx]);

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(ParseError::MalformedHeader)?;

        let raw_key = &line[..colon];
        let trimmed_key = trim_trailing_ows(raw_key);
        if trimmed_key.len() != raw_key.len() {
            return Err(ParseError::MalformedHeader);
        }

        for &b in raw_key {
            if !is_tchar(b) {
                return Err(ParseError::IllegalFieldNameChar);
            }
        }

        let raw_value = trim_ows(&line[colon + 1..]);
        let key = String::from_utf8_lossy(raw_key).to_ascii_lowercase();
        let value = String::from_utf8_lossy(raw_value).into_owned();

        self.set(key, value);

        Ok((consumed, false))
    }

    /// Insert a value, comma-folding it onto any existing value under the
    /// same key (order of appends is the order of arrival).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.inner
            .entry(key)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when no headers have been stored.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over `(lowercased key, folded value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse the `content-length` header as a non-negative integer.
    ///
    /// Returns `Ok(None)` when absent, `Err` when present but not a valid
    /// non-negative integer.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        match self.get("content-length") {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ParseError::BadContentLength),
        }
    }

    /// True when `transfer-encoding` contains `chunked` (RFC 9112 §6.1:
    /// takes precedence over `content-length` when both are present).
    pub fn is_chunked(&self) -> bool {
        self.get("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn trim_ows(s: &[u8]) -> &[u8] {
    trim_trailing_ows(trim_leading_ows(s))
}

fn trim_leading_ows(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(s.len());
    &s[start..]
}

fn trim_trailing_ows(s: &[u8]) -> &[u8] {
    let end = s
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t')
        .map_or(0, |p| p + 1);
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tchar_accepts_valid_bytes() {
        for &b in b"abcXYZ019!#$%&'*+-.^_`|~" {
            assert!(is_tchar(b), "expected tchar for byte 0x{b:02X}");
        }
    }

    #[test]
    fn tchar_rejects_invalid_bytes() {
        for &b in b" \t\r\n@[]{}" {
            assert!(!is_tchar(b), "expected non-tchar for byte 0x{b:02X}");
        }
    }

    #[test]
    fn needs_more_data_without_crlf() {
        let mut h = Headers::new();
        assert_eq!(h.parse(b"Host: example.com").unwrap(), (0, false));
    }

    #[test]
    fn blank_line_terminates() {
        let mut h = Headers::new();
        assert_eq!(h.parse(b"\r\nGET").unwrap(), (2, true));
    }

    #[test]
    fn single_header_line() {
        let mut h = Headers::new();
        let (n, done) = h.parse(b"Host: localhost:42069\r\n\r\n").unwrap();
        assert_eq!(n, 24);
        assert!(!done);
        assert_eq!(h.get("host"), Some("localhost:42069"));
        assert_eq!(h.get("Host"), Some("localhost:42069"));
        assert_eq!(h.get("HOST"), Some("localhost:42069"));
    }

    #[test]
    fn duplicate_keys_fold_with_comma_space() {
        let mut h = Headers::new();
        h.parse(b"Host: localhost\r\n").unwrap();
        h.parse(b"Host: example.com\r\n").unwrap();
        assert_eq!(h.get("host"), Some("localhost, example.com"));
    }

    #[test]
    fn missing_colon_is_malformed() {
        let mut h = Headers::new();
        assert_eq!(h.parse(b"Host localhost\r\n"), Err(ParseError::MalformedHeader));
    }

    #[test]
    fn space_before_colon_is_malformed() {
        let mut h = Headers::new();
        assert_eq!(h.parse(b"Host : x\r\n"), Err(ParseError::MalformedHeader));
    }

    #[test]
    fn illegal_field_name_char_rejected() {
        let mut h = Headers::new();
        assert_eq!(
            h.parse(b"Ho@st: x\r\n"),
            Err(ParseError::IllegalFieldNameChar)
        );
    }

    #[test]
    fn value_whitespace_is_trimmed() {
        let mut h = Headers::new();
        h.parse(b"X-Custom:   hello world   \r\n").unwrap();
        assert_eq!(h.get("x-custom"), Some("hello world"));
    }

    #[test]
    fn empty_value_is_preserved() {
        let mut h = Headers::new();
        h.parse(b"X-Empty:\r\n").unwrap();
        assert_eq!(h.get("x-empty"), Some(""));
    }

    #[test]
    fn missing_key_returns_none() {
        let h = Headers::new();
        assert_eq!(h.get("absent"), None);
    }
}
