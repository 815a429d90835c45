//! Regex-level cleanup applied to raw input before any parsing.

use std::sync::LazyLock;

use regex::Regex;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--([\s\S]*?)(?:-->|$)").unwrap());
static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!doctype[^>]*>").unwrap());
static PROCESSING_INSTRUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\?[\s\S]*?(?:\?>|$)").unwrap());
static CDATA_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!\[CDATA\[").unwrap());

/// Neutralises constructs that would confuse the markdown/HTML parsers or
/// hide markup from the sanitizer.
///
/// HTML comments become visible text (`(html comment removed: …)`) so
/// nothing can be smuggled inside them; doctypes and processing
/// instructions are dropped; CDATA openers are escaped; NUL bytes are
/// removed.
pub fn preliminary_sanitize(text: &str) -> String {
    let text = text.replace('\0', "");
    let text = HTML_COMMENT.replace_all(&text, "(html comment removed: $1)");
    let text = DOCTYPE.replace_all(&text, "");
    let text = PROCESSING_INSTRUCTION.replace_all(&text, "");
    CDATA_OPEN.replace_all(&text, "&lt;![CDATA[").into_owned()
}
