//! UTF-8 sanitization of label values.

use std::borrow::Cow;

use tracing::trace;

/// Sanitize raw bytes into valid UTF-8.
///
/// Invalid sequences are replaced with U+FFFD. Valid input is returned
/// borrowed and unchanged, so the function is idempotent.
///
/// Only raw byte sources can carry invalid UTF-8. A value that already made
/// it into a `&str` (every [`AttributeView`](crate::AttributeView) value, for
/// instance) is valid by construction, and sanitizing it is the identity.
pub fn sanitize_utf8(value: &[u8]) -> Cow<'_, str> {
    let out = String::from_utf8_lossy(value);
    if let Cow::Owned(_) = out {
        trace!(len = value.len(), "Replaced invalid UTF-8 in label value");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_unchanged() {
        for s in ["", "us-central1", "ünïcödé", "日本語", "emoji 🚀"] {
            let out = sanitize_utf8(s.as_bytes());
            assert!(matches!(out, Cow::Borrowed(_)));
            assert_eq!(out, s);
        }
    }

    #[test]
    fn test_invalid_sequences_replaced() {
        let raw = b"abc\xffdef\xc3";
        assert_eq!(sanitize_utf8(raw), "abc\u{FFFD}def\u{FFFD}");
    }

    #[test]
    fn test_str_input_is_identity() {
        let decoded = String::from_utf8_lossy(b"zone-\xff").into_owned();
        let out = sanitize_utf8(decoded.as_bytes());
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, decoded);
    }

    #[test]
    fn test_idempotent() {
        let raw = b"\xf0\x28\x8c\x28 label";
        let once = sanitize_utf8(raw).into_owned();
        let twice = sanitize_utf8(once.as_bytes());
        assert_eq!(once, twice);
    }
}
