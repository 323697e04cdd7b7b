//! Path patterns with `%s` placeholders.
//!
//! A pattern is produced for a schema node with one placeholder per list key,
//! e.g. `/m:top/item[id='%s']/value`. Filling substitutes concrete key
//! values in order.

use crate::{quote_literal, PathError};

/// Counts the `%s` placeholders of a pattern. `%%` is an escaped percent sign.
pub fn count_placeholders(pattern: &str) -> usize {
    let bytes = pattern.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 1 < bytes.len() {
            if bytes[i + 1] == b's' {
                count += 1;
            }
            i += 2;
            continue;
        }
        i += 1;
    }
    count
}

/// Substitutes `values` into the placeholders of `pattern`, in order.
///
/// A quoted placeholder `'%s'` is replaced by the value re-quoted with
/// [`quote_literal`], so values containing `'` stay well-formed. A bare `%s`
/// receives the raw value.
///
/// # Example
///
/// ```
/// use yangtree_path::fill_pattern;
///
/// let out = fill_pattern("/m:l[a='%s'][b='%s']", &["1", "2"]).unwrap();
/// assert_eq!(out, "/m:l[a='1'][b='2']");
/// assert!(fill_pattern("/m:l[a='%s']", &[] as &[&str]).is_err());
/// ```
pub fn fill_pattern<S: AsRef<str>>(pattern: &str, values: &[S]) -> Result<String, PathError> {
    let placeholders = count_placeholders(pattern);
    if placeholders != values.len() {
        return Err(PathError::PlaceholderMismatch {
            placeholders,
            values: values.len(),
        });
    }

    let extra: usize = values.iter().map(|v| v.as_ref().len()).sum();
    let mut out = String::with_capacity(pattern.len() + extra);
    let mut values = values.iter();
    let mut rest = pattern;
    while let Some(idx) = rest.find('%') {
        let after = &rest[idx + 1..];
        if after.starts_with('s') {
            let value: &str = match values.next() {
                Some(v) => v.as_ref(),
                None => "",
            };
            let head = &rest[..idx];
            if head.ends_with('\'') && after[1..].starts_with('\'') {
                out.push_str(&head[..head.len() - 1]);
                out.push_str(&quote_literal(value));
                rest = &after[2..];
            } else {
                out.push_str(head);
                out.push_str(value);
                rest = &after[1..];
            }
        } else if after.starts_with('%') {
            out.push_str(&rest[..idx]);
            out.push('%');
            rest = &after[1..];
        } else {
            out.push_str(&rest[..=idx]);
            rest = after;
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_placeholders_ignoring_escapes() {
        assert_eq!(count_placeholders("/m:a"), 0);
        assert_eq!(count_placeholders("/m:l[k='%s']"), 1);
        assert_eq!(count_placeholders("/m:l[k='%%s']"), 0);
        assert_eq!(count_placeholders("/m:l[a='%s'][b='%s']/x"), 2);
    }

    #[test]
    fn quoted_values_are_requoted() {
        assert_eq!(
            fill_pattern("/m:l[k='%s']", &["it's"]).unwrap(),
            "/m:l[k=\"it's\"]"
        );
    }

    #[test]
    fn bare_placeholders_and_escapes() {
        assert_eq!(fill_pattern("/m:%s", &["x"]).unwrap(), "/m:x");
        assert_eq!(
            fill_pattern("/m:l[k='100%%']", &[] as &[&str]).unwrap(),
            "/m:l[k='100%']"
        );
    }

    #[test]
    fn mismatched_value_count() {
        assert_eq!(
            fill_pattern("/m:l[k='%s']", &["a", "b"]),
            Err(PathError::PlaceholderMismatch {
                placeholders: 1,
                values: 2
            })
        );
    }
}
