//! Entity escaping for strings stored in save files.

/// Replace `&`, `<` and `>` with their entities.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`]. Unknown entities are left untouched.
pub fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(position) = rest.find('&') {
        out.push_str(&rest[..position]);
        rest = &rest[position..];
        let (replacement, consumed) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else {
            ('&', 1)
        };
        out.push(replacement);
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// Whether every `&` in the string starts one of the known entities, so
/// that `escape(unescape(s)) == s`.
pub fn is_well_formed(escaped: &str) -> bool {
    escaped.match_indices('&').all(|(i, _)| {
        let tail = &escaped[i..];
        tail.starts_with("&amp;") || tail.starts_with("&lt;") || tail.starts_with("&gt;")
    }) && !escaped.contains('<')
        && !escaped.contains('>')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_examples() {
        assert_eq!(escape("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(unescape("&lt;tag&gt; &amp;amp;"), "<tag> &amp;");
        assert_eq!(unescape("AT&T"), "AT&T");
    }

    proptest! {
        #[test]
        fn unescape_inverts_escape(raw in ".*") {
            prop_assert_eq!(unescape(&escape(&raw)), raw);
        }

        #[test]
        fn escape_inverts_unescape(raw in ".*") {
            let escaped = escape(&raw);
            prop_assert!(is_well_formed(&escaped));
            prop_assert_eq!(escape(&unescape(&escaped)), escaped);
        }
    }
}
