//! The end-to-end pipeline.

use crate::context::PostContext;
use crate::dom::DomParser;
use crate::embedder::AssetEmbedder;
use crate::error::{ConfigError, RenderError, SecurityError};
use crate::escape::escape_html;
use crate::format::{is_html, wrap_root};
use crate::markdown::MarkdownConverter;
use crate::options::RendererOptions;
use crate::plugin::{run_post_process, run_pre_process};
use crate::preliminary::preliminary_sanitize;
use crate::sanitizer::{SanitizationIssue, SanitizerConfig, TagTransformingSanitizer};
use crate::security::check_security;

/// Everything one render call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub html: String,
    /// Image sources and embed previews, in document order.
    pub images: Vec<String>,
    pub links: Vec<String>,
    pub sanitization_issues: Vec<SanitizationIssue>,
}

/// Renders untrusted post and comment bodies into safe HTML.
///
/// Immutable after construction and `Send + Sync`; all per-call state lives
/// inside the call, so one renderer can serve concurrent requests.
pub struct Renderer {
    options: RendererOptions,
    markdown: MarkdownConverter,
    embedder: AssetEmbedder,
    sanitizer: TagTransformingSanitizer,
}

impl Renderer {
    pub fn new(options: RendererOptions) -> Result<Self, ConfigError> {
        let sanitizer = TagTransformingSanitizer::new(SanitizerConfig::new(&options)?);
        let embedder = AssetEmbedder::with_default_matchers(options.host());
        let markdown = MarkdownConverter::new(options.breaks, options.spoiler.clone());

        Ok(Self {
            options,
            markdown,
            embedder,
            sanitizer,
        })
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Renders `input` (markdown or HTML) to safe HTML.
    ///
    /// Empty input renders to an empty string. Only a security rejection is
    /// an error; any other internal failure degrades to the escaped input in
    /// a single paragraph.
    pub fn render(&self, input: &str, ctx: Option<&PostContext>) -> Result<String, SecurityError> {
        self.render_report(input, ctx).map(|report| report.html)
    }

    /// [`render`](Self::render), plus the URLs and sanitizer findings of the
    /// call.
    pub fn render_report(
        &self,
        input: &str,
        ctx: Option<&PostContext>,
    ) -> Result<RenderReport, SecurityError> {
        let span = tracing::debug_span!(
            "render",
            author = ctx.and_then(|ctx| ctx.author.as_deref()),
            permlink = ctx.and_then(|ctx| ctx.permlink.as_deref()),
        );
        let _entered = span.enter();

        if input.trim().is_empty() {
            return Ok(RenderReport::default());
        }

        match self.run(input) {
            Ok(report) => Ok(report),
            Err(RenderError::Security(err)) => {
                tracing::error!(violation = %err.violation, snippet = %err.snippet, "rejected insecure content");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "render failed, falling back to escaped text");
                Ok(RenderReport {
                    html: format!("<p>{}</p>", escape_html(input)),
                    ..RenderReport::default()
                })
            }
        }
    }

    pub fn render_post_body(&self, body: &str) -> Result<String, SecurityError> {
        self.render(body, None)
    }

    pub fn render_comment_body(&self, body: &str) -> Result<String, SecurityError> {
        self.render(body, None)
    }

    fn run(&self, input: &str) -> Result<RenderReport, RenderError> {
        let text = run_pre_process(&self.options.plugins, input);
        let text = preliminary_sanitize(&text);

        let html = if is_html(&text) {
            text
        } else {
            self.markdown.to_html(&text)?
        };
        let html = wrap_root(&html);

        let parsed = DomParser::new(&self.options, &self.embedder).parse(&html)?;

        let (html, sanitization_issues) = if self.options.skip_sanitization {
            (parsed.html, Vec::new())
        } else {
            let sanitized = self.sanitizer.sanitize(&parsed.html)?;
            (sanitized.html, sanitized.issues)
        };

        check_security(&html, self.options.allow_insecure_script_tags)?;

        let html = self.embedder.insert_assets(&html, self.options.assets)?;
        let html = run_post_process(&self.options.plugins, &html);

        Ok(RenderReport {
            html,
            images: parsed.images,
            links: parsed.links,
            sanitization_issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecurityViolation;
    use crate::plugin::RendererPlugin;
    use pretty_assertions::assert_eq;

    fn renderer() -> Renderer {
        Renderer::new(RendererOptions::builder("https://hive.blog").build().unwrap()).unwrap()
    }

    #[test]
    fn renders_markdown_inside_single_root() {
        assert_eq!(
            renderer().render("**bold**", None).unwrap(),
            "<html><p><strong>bold</strong></p></html>"
        );
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(renderer().render("", None).unwrap(), "");
        assert_eq!(renderer().render("  \n", None).unwrap(), "");
    }

    #[test]
    fn rendering_is_idempotent_on_output() {
        let renderer = renderer();
        let once = renderer.render("hello *world*", None).unwrap();
        assert!(is_html(&once));
        assert_eq!(renderer.render(&once, None).unwrap(), once);
    }

    #[test]
    fn resolves_embeds_after_sanitizing() {
        let html = renderer()
            .render("https://www.youtube.com/watch?v=dQw4w9WgXcQ", None)
            .unwrap();

        assert!(html.contains(r#"<div class="videoWrapper"><iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ" width="640" height="480""#));
        assert!(!html.contains("~~~ embed:"));
    }

    #[test]
    fn forged_markers_stay_text() {
        let html = renderer()
            .render("<p>~~~ embed:not-a-number vimeo ~~~</p>", None)
            .unwrap();
        assert!(html.contains("~~~ embed:not-a-number vimeo ~~~"));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn insecure_scripts_pass_sanitization_only_when_skipped() {
        let options = RendererOptions::builder("https://hive.blog")
            .skip_sanitization(true)
            .build()
            .unwrap();
        let err = Renderer::new(options)
            .unwrap()
            .render("<p>x<script>alert(1)</script></p>", None)
            .unwrap_err();

        assert_eq!(err.violation, SecurityViolation::ScriptTag);
        assert!(renderer().render("<p>x<script>alert(1)</script></p>", None).is_ok());
    }

    #[test]
    fn runs_plugins_around_pipeline() {
        struct Shout;

        impl RendererPlugin for Shout {
            fn pre_process(&self, text: &str) -> String {
                text.replace("quiet", "LOUD")
            }

            fn post_process(&self, html: &str) -> String {
                format!("<!-- rendered -->{html}")
            }
        }

        let options = RendererOptions::builder("https://hive.blog")
            .plugin(Shout)
            .build()
            .unwrap();
        let html = Renderer::new(options).unwrap().render("quiet", None).unwrap();

        assert_eq!(html, "<!-- rendered --><html><p>LOUD</p></html>");
    }

    #[test]
    fn reports_images_links_and_issues() {
        let report = renderer()
            .render_report(
                "![cat](https://x.io/cat.png) [site](https://example.com)\n\n<iframe src=\"https://evil.example.com/x\"></iframe>",
                Some(&PostContext::new("alice", "hello")),
            )
            .unwrap();

        assert_eq!(report.images, vec!["https://x.io/cat.png".to_owned()]);
        assert_eq!(report.links, vec!["https://example.com".to_owned()]);
        assert_eq!(report.sanitization_issues.len(), 1);
    }
}
