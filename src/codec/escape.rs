//! Backslash escaping for the `;` / `|` delimited rule lists.

const ESCAPE: char = '\\';

/// Escape the rule delimiters and the escape character itself.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ESCAPE | ';' | '|') {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Reverse of [`escape`]. A trailing lone backslash is kept as-is.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(ESCAPE),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split on `sep` where it is not preceded by an escape. Segments stay escaped.
pub fn split_unescaped(
    s: &str,
    sep: char,
) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == ESCAPE {
            escaped = true;
        } else if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}
