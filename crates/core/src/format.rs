//! Markdown vs. HTML detection and the single-root wrapper.

use std::sync::LazyLock;

use regex::Regex;

static HTML_DOCUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<html>[\s\S]*</html>$").unwrap());
static HTML_PARAGRAPHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<p>[\s\S]*</p>$").unwrap());

/// Returns `true` when `text` should skip markdown conversion.
///
/// Either a full `<html>…</html>` wrap or a body that starts with `<p>` and
/// ends with `</p>`. Markdown that happens to start with a literal `<p>` is
/// classified as HTML, which keeps re-rendering already rendered output from
/// converting it twice.
pub fn is_html(text: &str) -> bool {
    let trimmed = text.trim();
    HTML_DOCUMENT.is_match(trimmed) || HTML_PARAGRAPHS.is_match(trimmed)
}

/// Wraps `html` in a single `<html>` root unless it already has one.
pub fn wrap_root(html: &str) -> String {
    let trimmed = html.trim();
    if HTML_DOCUMENT.is_match(trimmed) {
        trimmed.to_owned()
    } else {
        format!("<html>{trimmed}</html>")
    }
}
