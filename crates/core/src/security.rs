//! Final gate over sanitized HTML.
//!
//! A handful of case-insensitive patterns that must never appear in output,
//! whatever the sanitizer configuration.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{SecurityError, SecurityViolation};

static SCRIPT_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*script\b").unwrap());
static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<script[^>]*>").unwrap());
/// `javascript:` at the start of an attribute value, not somewhere inside one.
static JAVASCRIPT_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<[^>]*\s[a-z_:-]+\s*=\s*(?:"\s*|'\s*)?javascript\s*:"#).unwrap()
});
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<[^>]*[\s/]on[a-z]+\s*=").unwrap());

const SNIPPET_LEN: usize = 64;

/// Fails with [`SecurityError`] when `text` still contains a script tag, a
/// `javascript:` attribute value or an inline event handler, unless script
/// tags are explicitly allowed.
pub fn check_security(text: &str, allow_script_tag: bool) -> Result<(), SecurityError> {
    if allow_script_tag {
        return Ok(());
    }

    let checks: [(&Regex, SecurityViolation); 4] = [
        (&SCRIPT_OPEN, SecurityViolation::ScriptTag),
        (&SCRIPT_TAG, SecurityViolation::ScriptTag),
        (&JAVASCRIPT_URI, SecurityViolation::JavascriptUri),
        (&EVENT_HANDLER, SecurityViolation::EventHandler),
    ];

    for (pattern, violation) in checks {
        if let Some(found) = pattern.find(text) {
            return Err(SecurityError {
                violation,
                snippet: truncate(found.as_str()),
            });
        }
    }

    Ok(())
}

fn truncate(s: &str) -> String {
    match s.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(text: &str) -> Option<SecurityViolation> {
        check_security(text, false).err().map(|err| err.violation)
    }

    #[test]
    fn accepts_clean_markup() {
        assert_eq!(
            violation(r#"<p>Hello <a href="https://hive.blog">hive</a></p>"#),
            None
        );
        assert_eq!(violation("<p>learn javascript: the good parts</p>"), None);
        assert_eq!(violation("<p>set onclick= in your markup</p>"), None);
    }

    #[test]
    fn rejects_script_tags() {
        assert_eq!(
            violation("<p>x</p><script>alert(1)</script>"),
            Some(SecurityViolation::ScriptTag)
        );
        assert_eq!(
            violation("< SCRIPT src=//evil>"),
            Some(SecurityViolation::ScriptTag)
        );
    }

    #[test]
    fn rejects_javascript_uris() {
        assert_eq!(
            violation(r#"<a href="JavaScript:alert(1)">x</a>"#),
            Some(SecurityViolation::JavascriptUri)
        );
        assert_eq!(
            violation("<a title=x href= ' javascript:alert(1)'>x</a>"),
            Some(SecurityViolation::JavascriptUri)
        );
    }

    #[test]
    fn accepts_javascript_inside_urls() {
        assert_eq!(
            violation(r#"<a href="https://google.com/search?q=javascript:void">s</a>"#),
            None
        );
    }

    #[test]
    fn rejects_event_handlers() {
        assert_eq!(
            violation(r#"<img src="x" onerror="alert(1)">"#),
            Some(SecurityViolation::EventHandler)
        );
        assert_eq!(
            violation("<svg/onload=alert(1)>"),
            Some(SecurityViolation::EventHandler)
        );
    }

    #[test]
    fn allows_everything_when_script_tags_are_allowed() {
        assert!(check_security("<script>alert(1)</script>", true).is_ok());
    }

    #[test]
    fn error_carries_matched_fragment() {
        let err = check_security("<p><script type=module>", false).unwrap_err();
        assert_eq!(err.snippet, "<script");
    }
}
