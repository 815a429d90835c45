//! Anchors whose visible text names a different site than they link to.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::options::host_of;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>([^<]*)</a>"#).unwrap()
});
static DOMAIN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?((?:[a-z0-9-]+\.)+[a-z]{2,})(?:[/:?#]\S*)?$").unwrap()
});

/// Scans `html` for text-only anchors and returns `href -> text` for those
/// whose text looks like a domain other than the one linked to.
///
/// Relative hrefs count as pointing at `base_host`.
pub(crate) fn suspicious_links(html: &str, base_host: &str) -> HashMap<String, String> {
    let mut found = HashMap::new();

    for caps in ANCHOR.captures_iter(html) {
        let href = &caps[1];
        let text = caps[2].trim();
        if found.contains_key(href) {
            continue;
        }
        if names_other_domain(href, text, base_host) {
            found.insert(href.to_owned(), text.to_owned());
        }
    }

    found
}

fn names_other_domain(href: &str, text: &str, base_host: &str) -> bool {
    let Some(caps) = DOMAIN_TEXT.captures(text) else {
        return false;
    };
    let shown = normalize_host(&caps[1]);

    let href = href.trim();
    let target = match host_of(href) {
        Some(host) => host,
        None => match href.strip_prefix("//") {
            Some(rest) => rest.split(['/', '?', '#', ':']).next().unwrap_or_default(),
            None if href.contains(':') => return false,
            None => base_host,
        },
    };

    shown != normalize_host(target)
}

fn normalize_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_owned(),
        None => host,
    }
}
