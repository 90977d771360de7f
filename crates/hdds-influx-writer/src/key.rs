// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line Protocol key encoding.
//!
//! A key is the measurement and tag set prefix of a point:
//! ```text
//! measurement,tag1=val1,tag2=val2
//! ```
//!
//! Only commas and spaces are escaped, and only in the measurement and in
//! tag values. Tag keys are written verbatim, `=` is never escaped. Field
//! sets and timestamps are the caller's business.
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use std::borrow::Cow;

use crate::tags::TagSet;

/// Encode `measurement` and `tags` into a Line Protocol key.
///
/// Tags are written in [`TagSet::sorted_keys`] order. The output carries no
/// trailing separator.
///
/// ```
/// use hdds_influx_writer::{encode_key, TagSet};
///
/// let tags: TagSet = [("host", "a,b c")].into_iter().collect();
/// assert_eq!(encode_key("cpu", &tags), b"cpu,host=a\\,b\\ c");
/// ```
pub fn encode_key(measurement: &str, tags: &TagSet) -> Vec<u8> {
    let keys = tags.sorted_keys();
    let measurement = escape(measurement);

    let mut size = measurement.len();
    let mut values = Vec::with_capacity(keys.len());
    for key in &keys {
        let value = escape(tags.get(key).unwrap_or_default());
        // ,<key>=<value>
        size += key.len() + value.len() + 2;
        values.push(value);
    }

    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(measurement.as_bytes());
    for (key, value) in keys.iter().zip(&values) {
        buf.push(b',');
        buf.extend_from_slice(key.as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(value.as_bytes());
    }
    debug_assert_eq!(buf.len(), size);
    buf
}

/// Backslash-escape every comma and space in `s`.
///
/// Returns the input borrowed when there is nothing to escape, so the
/// common case never allocates.
pub fn escape(s: &str) -> Cow<'_, str> {
    let extra = s.bytes().filter(|&b| needs_escape(b)).count();
    if extra == 0 {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + extra);
    let mut start = 0;
    for (i, b) in s.bytes().enumerate() {
        if needs_escape(b) {
            out.push_str(&s[start..i]);
            out.push('\\');
            start = i;
        }
    }
    out.push_str(&s[start..]);
    Cow::Owned(out)
}

#[inline]
fn needs_escape(b: u8) -> bool {
    b == b',' || b == b' '
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        pairs.iter().copied().collect()
    }

    /// Inverse of `escape` for inputs that held no backslashes.
    fn unescape(s: &str) -> String {
        s.replace("\\,", ",").replace("\\ ", " ")
    }

    #[test]
    fn test_encode_key_escapes_tag_value() {
        let key = encode_key("cpu", &tags(&[("host", "a,b c")]));
        assert_eq!(key, b"cpu,host=a\\,b\\ c");
    }

    #[test]
    fn test_encode_key_escapes_measurement_without_tags() {
        let key = encode_key("cpu usage", &TagSet::new());
        assert_eq!(key, b"cpu\\ usage");
    }

    #[test]
    fn test_encode_key_sorts_tags() {
        let key = encode_key("x", &tags(&[("b", "2"), ("a", "1")]));
        assert_eq!(key, b"x,a=1,b=2");
    }

    #[test]
    fn test_encode_key_leaves_tag_keys_unescaped() {
        let key = encode_key("m", &tags(&[("tag key", "v"), ("k,2", "w")]));
        assert_eq!(key, b"m,k,2=w,tag key=v");
    }

    #[test]
    fn test_encode_key_does_not_escape_equals() {
        let key = encode_key("a=b", &tags(&[("k", "x=y")]));
        assert_eq!(key, b"a=b,k=x=y");
    }

    #[test]
    fn test_encode_key_empty_measurement_and_value() {
        assert!(encode_key("", &TagSet::new()).is_empty());
        assert_eq!(encode_key("", &tags(&[("k", "")])), b",k=");
    }

    #[test]
    fn test_encode_key_exact_capacity() {
        let key = encode_key("disk io", &tags(&[("dev", "sda 1"), ("host", "h,1")]));
        assert_eq!(key, b"disk\\ io,dev=sda\\ 1,host=h\\,1");
        assert_eq!(key.len(), 29);
    }

    #[test]
    fn test_escape_borrows_when_clean() {
        let input = "temperature";
        let escaped = escape(input);
        match escaped {
            Cow::Borrowed(s) => {
                assert!(std::ptr::eq(s, input));
                assert_eq!(s.len(), input.len());
            }
            Cow::Owned(_) => panic!("clean input must not allocate"),
        }
    }

    #[test]
    fn test_escape_empty() {
        let escaped = escape("");
        assert!(matches!(escaped, Cow::Borrowed("")));
        assert_eq!(escaped.len(), 0);
    }

    #[test]
    fn test_escape_only_separators_doubles_length() {
        let input = ", ,,  ,";
        let escaped = escape(input);
        assert_eq!(escaped.len(), input.len() * 2);
        assert_eq!(escaped, "\\,\\ \\,\\,\\ \\ \\,");
    }

    #[test]
    fn test_escape_leading_and_trailing() {
        assert_eq!(escape(" a,"), "\\ a\\,");
    }

    #[test]
    fn test_escape_ignores_existing_backslashes() {
        // A separator after a backslash is escaped again; the backslash itself is kept.
        assert_eq!(escape("a\\,b"), "a\\\\,b");
        assert_eq!(escape("a\\ b"), "a\\\\ b");
        assert!(matches!(escape("c:\\dir"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_multibyte() {
        assert_eq!(escape("températ ure,°C"), "températ\\ ure\\,°C");
        assert!(matches!(escape("日本語"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_key_unescape_reconstructs_inputs() {
        const ALPHABET: &[char] = &['a', 'b', 'Z', '0', ',', ' ', '=', '_', 'é'];

        fn random_string(rng: &mut fastrand::Rng, max: usize) -> String {
            let n = rng.usize(0..=max);
            (0..n).map(|_| ALPHABET[rng.usize(..ALPHABET.len())]).collect()
        }

        let mut rng = fastrand::Rng::with_seed(0x1f1u64);
        for _ in 0..500 {
            let measurement = random_string(&mut rng, 12);
            let mut set = TagSet::new();
            for i in 0..rng.usize(0..4) {
                // Keys are kept free of separators so the output can be split.
                set.insert(format!("k{}", i), random_string(&mut rng, 10));
            }

            let key = String::from_utf8(encode_key(&measurement, &set)).expect("utf8");

            // Split on separators that are not preceded by a backslash.
            let mut parts = Vec::new();
            let mut current = String::new();
            let mut escaped = false;
            for c in key.chars() {
                if c == ',' && !escaped {
                    parts.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
                escaped = c == '\\';
            }
            parts.push(current);

            assert_eq!(unescape(&parts[0]), measurement);
            assert_eq!(parts.len(), set.len() + 1);
            for (part, name) in parts[1..].iter().zip(set.sorted_keys()) {
                let (k, v) = part.split_once('=').expect("tag separator");
                assert_eq!(k, name);
                assert_eq!(unescape(v), set.get(name).unwrap_or_default());
            }
        }
    }
}
