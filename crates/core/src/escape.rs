//! Escaping for text that gets written back into markup, and the URL
//! normalisation the sanitizer judges link schemes on.

use std::borrow::Cow;

/// Escapes the characters that carry meaning in HTML text and attribute
/// values: `&`, `<`, `>`, `"` and `'`.
///
/// Most labels and URLs need no escaping at all, so the input is borrowed
/// back unless one of those characters shows up.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    let Some(first) = s.find(['&', '<', '>', '"', '\'']) else {
        return Cow::Borrowed(s);
    };

    let mut escaped = String::with_capacity(s.len() + 16);
    escaped.push_str(&s[..first]);
    for ch in s[first..].chars() {
        match entity(ch) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

fn entity(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Decodes the numeric and named character references an attacker can use
/// to hide a URL scheme (`jav&#x61;script&colon;`), and drops ASCII
/// whitespace/control characters the way browsers do before scheme parsing.
///
/// Only used for policy decisions; the original value is what gets written.
pub(crate) fn normalize_url_for_scheme(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match decode_reference(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out.chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_control())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn decode_reference(tail: &str) -> Option<(char, usize)> {
    const NAMED: &[(&str, char)] = &[
        ("&colon;", ':'),
        ("&tab;", '\t'),
        ("&newline;", '\n'),
        ("&sol;", '/'),
        ("&amp;", '&'),
        ("&lpar;", '('),
        ("&rpar;", ')'),
    ];

    for (name, ch) in NAMED {
        if tail
            .get(..name.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        {
            return Some((*ch, name.len()));
        }
    }

    let body = tail.strip_prefix("&#")?;
    let (digits, radix, skip) = match body.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16, 3),
        None => (body, 10, 2),
    };
    let len = digits
        .chars()
        .take_while(|ch| ch.is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let code = u32::from_str_radix(&digits[..len], radix).ok()?;
    let ch = char::from_u32(code)?;
    let terminator = usize::from(digits[len..].starts_with(';'));
    Some((ch, skip + len + terminator))
}
