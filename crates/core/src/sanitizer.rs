//! Allow-list sanitizer run over the document after the DOM pass.
//!
//! Every element is either kept (with a per-tag attribute policy),
//! unwrapped (content kept), or removed together with its content. Iframes
//! survive only when their source matches a known embed player; images only
//! with absolute http(s) or protocol-relative sources.

use std::cell::RefCell;
use std::sync::LazyLock;

use lol_html::html_content::{ContentType, Element};
use lol_html::{HandlerResult, Settings, doc_comments, element};
use regex::{Captures, Regex};

use crate::embedder::MARKER_OPEN;
use crate::error::{ConfigError, RenderError};
use crate::escape::{escape_html, normalize_url_for_scheme};
use crate::options::{AssetSize, LinkPredicate, RendererOptions};
use crate::streaming_rewriter::rewrite_str;

const ALLOWED_TAGS: &[&str] = &[
    "html", "div", "iframe", "del", "a", "p", "b", "i", "q", "br", "ul", "li", "ol", "img", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "blockquote", "pre", "code", "em", "strong", "center",
    "table", "thead", "tbody", "tr", "th", "td", "strike", "s", "sup", "sub", "span", "details",
    "summary", "u",
];

/// Dropped together with everything inside them.
const REMOVED_WITH_CONTENT: &[&str] = &[
    "script", "style", "textarea", "noscript", "title", "xmp", "template", "object", "embed",
];

const DIV_CLASS_WHITELIST: &[&str] = &[
    "pull-right",
    "pull-left",
    "text-justify",
    "text-rtl",
    "text-center",
    "text-right",
    "videoWrapper",
    "phishy",
];

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

const BROKEN_IMAGE: &str = "brokenimg.jpg";

/// [`MARKER_OPEN`] with its colon as a character reference: reads the same in
/// a tooltip, never matches a marker.
const INERT_MARKER_OPEN: &str = "~~~ embed&#58;";

type Canonicalize = fn(&Captures<'_>) -> String;

/// Embed players an iframe may point at, with the canonical `src` each
/// match is rewritten to. First match wins.
static IFRAME_WHITELIST: LazyLock<Vec<(Regex, Canonicalize)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"^(?i:https?:)?//player\.vimeo\.com/video/(\d+)").unwrap(),
            vimeo_player as Canonicalize,
        ),
        (
            Regex::new(r"^(?i:https?:)?//www\.youtube\.com/embed/([A-Za-z0-9_-]+)").unwrap(),
            youtube_player as Canonicalize,
        ),
        (
            Regex::new(r"^(?i:https?:)?//player\.twitch\.tv/\?[\w=&;.%-]*").unwrap(),
            whole_match as Canonicalize,
        ),
        (
            Regex::new(
                r"^(?i:https?:)?//open\.spotify\.com/(?:embed|embed-podcast)/(?:playlist|show|episode|track|album|artist)/[A-Za-z0-9]+",
            )
            .unwrap(),
            whole_match as Canonicalize,
        ),
        (
            Regex::new(r"^(?i:https?:)?//3speak\.(?:tv|online|co)/embed\?v=[\w.-]+/[\w-]+").unwrap(),
            whole_match as Canonicalize,
        ),
    ]
});

static IMAGE_SRC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?i:https?:)?//").unwrap());

fn vimeo_player(caps: &Captures<'_>) -> String {
    format!("https://player.vimeo.com/video/{}", &caps[1])
}

fn youtube_player(caps: &Captures<'_>) -> String {
    format!("https://www.youtube.com/embed/{}", &caps[1])
}

fn whole_match(caps: &Captures<'_>) -> String {
    caps[0].to_owned()
}

/// Something the sanitizer had to replace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanitizationIssue {
    #[error("unsupported iframe source `{src}`")]
    UnsupportedIframe { src: String },

    #[error("invalid image source `{src}`")]
    InvalidImageSrc { src: String },
}

/// Result of one [`TagTransformingSanitizer::sanitize`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub html: String,
    pub issues: Vec<SanitizationIssue>,
}

/// Link and media policy, fixed at construction.
pub struct SanitizerConfig {
    iframe: AssetSize,
    add_nofollow: bool,
    add_target_blank: bool,
    hide_images: bool,
    no_image_text: String,
    phishing_warning: String,
    internal_class: Option<String>,
    external_class: Option<String>,
    is_link_safe: LinkPredicate,
    is_external: LinkPredicate,
}

impl SanitizerConfig {
    pub fn new(options: &RendererOptions) -> Result<Self, ConfigError> {
        if options.assets.width == 0 || options.assets.height == 0 {
            return Err(ConfigError::invalid(
                "assets_size",
                "iframe dimensions must be positive",
            ));
        }

        Ok(Self {
            iframe: options.assets,
            add_nofollow: options.add_nofollow_to_links,
            add_target_blank: options.add_target_blank_to_links,
            hide_images: options.do_not_show_images,
            no_image_text: options.localization.no_image.clone(),
            phishing_warning: options.localization.phishing_warning.clone(),
            internal_class: options.css_class_for_internal_links.clone(),
            external_class: options.css_class_for_external_links.clone(),
            is_link_safe: options.is_link_safe_fn.clone(),
            is_external: options.add_external_css_class_to_matching_links_fn.clone(),
        })
    }
}

pub struct TagTransformingSanitizer {
    config: SanitizerConfig,
}

impl TagTransformingSanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    pub fn sanitize(&self, html: &str) -> Result<Sanitized, RenderError> {
        let issues = RefCell::new(Vec::new());

        let mut settings = Settings::default();
        settings.element_content_handlers = vec![element!("*", |el| self.transform(el, &issues))];
        settings.document_content_handlers = vec![doc_comments!(|comment| {
            comment.remove();
            Ok(())
        })];

        let html = rewrite_str(html, settings)?;
        Ok(Sanitized {
            html,
            issues: issues.take(),
        })
    }

    fn transform(
        &self,
        el: &mut Element<'_, '_>,
        issues: &RefCell<Vec<SanitizationIssue>>,
    ) -> HandlerResult {
        let tag = el.tag_name().to_ascii_lowercase();

        if REMOVED_WITH_CONTENT.contains(&tag.as_str()) {
            el.remove();
            return Ok(());
        }
        if !ALLOWED_TAGS.contains(&tag.as_str()) {
            el.remove_and_keep_content();
            return Ok(());
        }

        let attrs = Attributes::take(el);

        match tag.as_str() {
            "iframe" => self.iframe(el, &attrs, issues),
            "img" => self.image(el, &attrs, issues),
            "a" => self.anchor(el, &attrs),
            "div" => self.div(el, &attrs),
            "td" | "th" => table_cell(el, &attrs),
            "ol" => match attrs.get("start") {
                Some(start) if !start.is_empty() && start.bytes().all(|b| b.is_ascii_digit()) => {
                    Ok(el.set_attribute("start", start)?)
                }
                _ => Ok(()),
            },
            "span" => set_classes(el, &attrs, |class| class.starts_with("hljs-")),
            "code" => set_classes(el, &attrs, |class| {
                class == "hljs" || class.starts_with("language-")
            }),
            _ => Ok(()),
        }
    }

    fn iframe(
        &self,
        el: &mut Element<'_, '_>,
        attrs: &Attributes,
        issues: &RefCell<Vec<SanitizationIssue>>,
    ) -> HandlerResult {
        let src = attrs.get("src").unwrap_or_default();
        let allowed = IFRAME_WHITELIST
            .iter()
            .find_map(|(pattern, canonicalize)| pattern.captures(src).map(|caps| canonicalize(&caps)));

        let Some(src) = allowed else {
            tracing::warn!(src, "replacing iframe with unsupported source");
            el.replace(
                &format!("<div>(Unsupported {})</div>", escape_html(src)),
                ContentType::Html,
            );
            issues
                .borrow_mut()
                .push(SanitizationIssue::UnsupportedIframe { src: src.to_owned() });
            return Ok(());
        };

        el.set_attribute("src", &src)?;
        el.set_attribute("width", &self.config.iframe.width.to_string())?;
        el.set_attribute("height", &self.config.iframe.height.to_string())?;
        el.set_attribute("frameborder", "0")?;
        el.set_attribute("allowfullscreen", "allowfullscreen")?;
        el.set_attribute("webkitallowfullscreen", "webkitallowfullscreen")?;
        el.set_attribute("mozallowfullscreen", "mozallowfullscreen")?;
        Ok(())
    }

    fn image(
        &self,
        el: &mut Element<'_, '_>,
        attrs: &Attributes,
        issues: &RefCell<Vec<SanitizationIssue>>,
    ) -> HandlerResult {
        if self.config.hide_images {
            el.replace(
                &format!("<div>{}</div>", escape_html(&self.config.no_image_text)),
                ContentType::Html,
            );
            return Ok(());
        }

        let src = attrs.get("src").unwrap_or_default();
        if IMAGE_SRC.is_match(src) {
            let src = match src.get(..5) {
                Some(scheme) if scheme.eq_ignore_ascii_case("http:") => &src[5..],
                _ => src,
            };
            el.set_attribute("src", src)?;
        } else {
            tracing::warn!(src, "replacing image with invalid source");
            issues
                .borrow_mut()
                .push(SanitizationIssue::InvalidImageSrc { src: src.to_owned() });
            el.set_attribute("src", BROKEN_IMAGE)?;
        }

        if let Some(alt) = attrs.get("alt") {
            el.set_attribute("alt", alt)?;
        }
        Ok(())
    }

    fn anchor(&self, el: &mut Element<'_, '_>, attrs: &Attributes) -> HandlerResult {
        let href = attrs.get("href").filter(|href| has_allowed_scheme(href));

        if let Some(href) = href {
            el.set_attribute("href", href)?;
        }
        if let Some(title) = attrs.get("title") {
            el.set_attribute("title", title)?;
        }

        let Some(href) = href else {
            return Ok(());
        };

        if !(self.config.is_link_safe)(href) {
            let rel = if self.config.add_nofollow {
                "nofollow noopener"
            } else {
                "noopener"
            };
            el.set_attribute("rel", rel)?;
            if self.config.add_target_blank {
                el.set_attribute("target", "_blank")?;
            }
        }

        let class = if (self.config.is_external)(href) {
            self.config.external_class.as_deref()
        } else {
            self.config.internal_class.as_deref()
        };
        if let Some(class) = class {
            el.set_attribute("class", class)?;
        }
        Ok(())
    }

    fn div(&self, el: &mut Element<'_, '_>, attrs: &Attributes) -> HandlerResult {
        set_classes(el, attrs, |class| DIV_CLASS_WHITELIST.contains(&class))?;

        let phishy = attrs
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|class| class == "phishy"));
        if let Some(title) = attrs.get("title") {
            let is_warning =
                title == self.config.phishing_warning || title == escape_html(&self.config.phishing_warning);
            if phishy && is_warning {
                el.set_attribute("title", title)?;
            }
        }
        Ok(())
    }
}

/// Raw attribute values of an element, removed from it on capture so
/// handlers only have to put back what they allow. Embed markers in the
/// values are defused on capture.
struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn take(el: &mut Element<'_, '_>) -> Self {
        let attrs: Vec<(String, String)> = el
            .attributes()
            .iter()
            .map(|attr| (attr.name().to_ascii_lowercase(), defuse_markers(attr.value())))
            .collect();
        for (name, _) in &attrs {
            el.remove_attribute(name);
        }
        Self(attrs)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.trim())
    }
}

fn defuse_markers(value: String) -> String {
    if value.contains(MARKER_OPEN) {
        value.replace(MARKER_OPEN, INERT_MARKER_OPEN)
    } else {
        value
    }
}

fn set_classes(
    el: &mut Element<'_, '_>,
    attrs: &Attributes,
    keep: impl Fn(&str) -> bool,
) -> HandlerResult {
    let Some(classes) = attrs.get("class") else {
        return Ok(());
    };
    let kept: Vec<&str> = classes.split_whitespace().filter(|class| keep(class)).collect();
    if !kept.is_empty() {
        el.set_attribute("class", &kept.join(" "))?;
    }
    Ok(())
}

/// Only right and centre alignment survive, in canonical form.
fn table_cell(el: &mut Element<'_, '_>, attrs: &Attributes) -> HandlerResult {
    let Some(style) = attrs.get("style") else {
        return Ok(());
    };
    let style: String = style
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match style.trim_end_matches(';') {
        canonical @ ("text-align:right" | "text-align:center") => {
            Ok(el.set_attribute("style", canonical)?)
        }
        _ => Ok(()),
    }
}

/// Relative links pass; absolute ones need an allowed scheme once entity
/// and whitespace obfuscation is undone.
fn has_allowed_scheme(href: &str) -> bool {
    let normalized = normalize_url_for_scheme(href);
    let scheme_end = normalized.find(':');
    let path_start = normalized.find(['/', '?', '#']);

    match (scheme_end, path_start) {
        (Some(colon), Some(slash)) if slash < colon => true,
        (Some(colon), _) => LINK_SCHEMES.contains(&&normalized[..colon]),
        (None, _) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::LocalizationOptions;
    use pretty_assertions::assert_eq;

    fn sanitizer_with(options: &RendererOptions) -> TagTransformingSanitizer {
        TagTransformingSanitizer::new(SanitizerConfig::new(options).unwrap())
    }

    fn sanitize(html: &str) -> Sanitized {
        let options = RendererOptions::builder("https://hive.blog").build().unwrap();
        sanitizer_with(&options).sanitize(html).unwrap()
    }

    #[test]
    fn removes_dangerous_elements_with_content() {
        assert_eq!(
            sanitize("<p>a<script>alert(1)</script><style>p{}</style>b</p>").html,
            "<p>ab</p>"
        );
    }

    #[test]
    fn unwraps_unknown_elements() {
        assert_eq!(
            sanitize("<section><p>kept</p><font color=red>text</font></section>").html,
            "<p>kept</p>text"
        );
    }

    #[test]
    fn strips_attributes_and_comments() {
        assert_eq!(
            sanitize(r#"<p onclick="x()" style="color:red">hi<!-- c --></p>"#).html,
            "<p>hi</p>"
        );
    }

    #[test]
    fn canonicalizes_whitelisted_iframes() {
        let sanitized = sanitize(r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1" onload="x"></iframe>"#);

        assert_eq!(
            sanitized.html,
            concat!(
                r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ" width="640" height="480" "#,
                r#"frameborder="0" allowfullscreen="allowfullscreen" webkitallowfullscreen="webkitallowfullscreen" "#,
                r#"mozallowfullscreen="mozallowfullscreen"></iframe>"#
            )
        );
        assert!(sanitized.issues.is_empty());
    }

    #[test]
    fn replaces_unsupported_iframes() {
        let sanitized = sanitize(r#"<iframe src="https://evil.example.com/x"></iframe>"#);

        assert_eq!(sanitized.html, "<div>(Unsupported https://evil.example.com/x)</div>");
        assert_eq!(
            sanitized.issues,
            vec![SanitizationIssue::UnsupportedIframe {
                src: "https://evil.example.com/x".to_owned()
            }]
        );
    }

    #[test]
    fn issues_do_not_accumulate_between_calls() {
        let options = RendererOptions::builder("https://hive.blog").build().unwrap();
        let sanitizer = sanitizer_with(&options);

        let first = sanitizer.sanitize(r#"<img src="javascript:alert(1)">"#).unwrap();
        let second = sanitizer.sanitize("<p>clean</p>").unwrap();

        assert_eq!(first.issues.len(), 1);
        assert!(second.issues.is_empty());
    }

    #[test]
    fn validates_image_sources() {
        assert_eq!(
            sanitize(r#"<img src="http://x.io/a.png" alt="cat" width="9">"#).html,
            r#"<img src="//x.io/a.png" alt="cat">"#
        );
        assert_eq!(
            sanitize(r#"<img src="data:image/png;base64,AA">"#).html,
            r#"<img src="brokenimg.jpg">"#
        );
    }

    #[test]
    fn decorates_external_links() {
        assert_eq!(
            sanitize(r#"<a href="https://example.com" target="_self" id="x">ext</a>"#).html,
            r#"<a href="https://example.com" rel="nofollow noopener" target="_blank" class="link-external">ext</a>"#
        );
        assert_eq!(
            sanitize(r#"<a href="/@alice">internal</a>"#).html,
            r#"<a href="/@alice" class="link-internal">internal</a>"#
        );
    }

    #[test]
    fn omits_nofollow_when_disabled() {
        let options = RendererOptions::builder("https://hive.blog")
            .add_nofollow_to_links(false)
            .build()
            .unwrap();
        let html = sanitizer_with(&options)
            .sanitize(r#"<a href="https://example.com">ext</a>"#)
            .unwrap()
            .html;

        assert_eq!(
            html,
            r#"<a href="https://example.com" rel="noopener" target="_blank" class="link-external">ext</a>"#
        );
    }

    #[test]
    fn keeps_numeric_list_start() {
        assert_eq!(
            sanitize(r#"<ol start="3" type="a"><li>c</li></ol>"#).html,
            r#"<ol start="3"><li>c</li></ol>"#
        );
        assert_eq!(
            sanitize(r#"<ol start="3;x"><li>c</li></ol>"#).html,
            "<ol><li>c</li></ol>"
        );
    }

    #[test]
    fn defuses_markers_in_attribute_values() {
        let html = sanitize(concat!(
            r#"<a href="/x" title="~~~ embed:dQw4w9WgXcQ youtube ~~~">x</a>"#,
            r#"<img src="https://x.io/a.png" alt="~~~ embed:76979871 vimeo ~~~">"#,
        ))
        .html;

        assert_eq!(
            html,
            concat!(
                r#"<a href="/x" title="~~~ embed&#58;dQw4w9WgXcQ youtube ~~~" class="link-internal">x</a>"#,
                r#"<img src="https://x.io/a.png" alt="~~~ embed&#58;76979871 vimeo ~~~">"#,
            )
        );
    }

    #[test]
    fn drops_script_hrefs() {
        for href in [
            "javascript:alert(1)",
            "JaVaScRiPt:alert(1)",
            "jav&#x61;script&colon;alert(1)",
            " vbscript:x",
            "data:text/html,x",
        ] {
            assert_eq!(
                sanitize(&format!(r#"<a href="{href}">x</a>"#)).html,
                "<a>x</a>",
                "{href}"
            );
        }
        assert!(has_allowed_scheme("mailto:a@b.c"));
        assert!(has_allowed_scheme("/path?x=a:b"));
    }

    #[test]
    fn filters_div_classes_and_titles() {
        assert_eq!(
            sanitize(r#"<div class="pull-right evil" title="hi">x</div>"#).html,
            r#"<div class="pull-right">x</div>"#
        );

        let warning = LocalizationOptions::default().phishing_warning;
        let html = format!(r#"<div class="phishy" title="{warning}">x</div>"#);
        assert_eq!(sanitize(&html).html, html);
    }

    #[test]
    fn normalizes_table_alignment() {
        assert_eq!(
            sanitize(r#"<table><tr><td style="TEXT-ALIGN : Right ;">a</td><th style="color:red">b</th></tr></table>"#).html,
            r#"<table><tr><td style="text-align:right">a</td><th>b</th></tr></table>"#
        );
    }

    #[test]
    fn keeps_highlighting_classes() {
        assert_eq!(
            sanitize(r#"<pre><code class="language-rust hljs evil"><span class="hljs-keyword x">fn</span></code></pre>"#).html,
            r#"<pre><code class="language-rust hljs"><span class="hljs-keyword">fn</span></code></pre>"#
        );
    }

    #[test]
    fn hides_images_when_asked() {
        let options = RendererOptions::builder("https://hive.blog")
            .do_not_show_images(true)
            .build()
            .unwrap();
        let html = sanitizer_with(&options)
            .sanitize(r#"<img src="https://x.io/a.png">"#)
            .unwrap()
            .html;
        assert_eq!(html, format!("<div>{}</div>", options.localization().no_image));
    }
}
