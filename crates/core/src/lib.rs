//! Safe rendering of Hive post and comment bodies.
//!
//! [`Renderer`] takes untrusted markdown or HTML and runs it through a fixed
//! pipeline: plugins, a regex pre-clean, markdown conversion, a lol_html DOM
//! pass (images, links, mentions, hashtags, embeds), the allow-list
//! sanitizer, a final security gate and embed resolution.

pub mod adapter;
pub mod config;
pub mod context;
pub mod dom;
pub mod embedder;
pub mod error;
pub mod escape;
pub mod format;
pub mod localization;
pub mod markdown;
pub mod options;
pub mod plugin;
pub mod preliminary;
pub mod renderer;
pub mod sanitizer;
pub mod security;
pub mod streaming_rewriter;

pub use adapter::PipeAdapter;
pub use config::RendererConfig;
pub use context::PostContext;
pub use dom::{DomParser, ParsedDocument};
pub use embedder::{AssetEmbedder, EmbedMatcher, EmbedMetadata};
pub use error::{ConfigError, RenderError, SecurityError, SecurityViolation};
pub use escape::escape_html;
pub use format::{is_html, wrap_root};
pub use localization::{LocalizationOptions, validate_account_name};
pub use markdown::MarkdownConverter;
pub use options::{AssetSize, RendererOptions, RendererOptionsBuilder, SpoilerOptions};
pub use plugin::RendererPlugin;
pub use preliminary::preliminary_sanitize;
pub use renderer::{RenderReport, Renderer};
pub use sanitizer::{SanitizationIssue, Sanitized, SanitizerConfig, TagTransformingSanitizer};
pub use security::check_security;
pub use streaming_rewriter::StreamingRewriter;

/// Version of the rendering core, reported by the bindings.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Renderer>();
    }

    #[test]
    fn reports_version() {
        assert!(!version().is_empty());
    }
}
