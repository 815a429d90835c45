//! Provider matchers and embed-marker resolution.
//!
//! The DOM pass asks each [`EmbedMatcher`] in registration order whether a
//! text node mentions one of its URLs; the first one that recognises it wins
//! and the URL is swapped for an opaque marker (`~~~ embed:{id} {kind} ~~~`).
//! After sanitization, [`AssetEmbedder::insert_assets`] turns markers back
//! into provider iframes. Only markers in text nodes outside `a`, `code` and
//! `pre` resolve; everything else, including markers that do not resolve,
//! stays inert text.

mod spotify;
mod threespeak;
mod twitch;
mod vimeo;
mod youtube;

use std::cell::Cell;
use std::rc::Rc;
use std::sync::LazyLock;

use lol_html::html_content::{ContentType, TextType};
use lol_html::{Settings, doc_text, element};
use regex::{Captures, Regex};

pub use spotify::SpotifyMatcher;
pub use threespeak::ThreeSpeakMatcher;
pub use twitch::TwitchMatcher;
pub use vimeo::VimeoMatcher;
pub use youtube::YouTubeMatcher;

use crate::dom::{VERBATIM_ELEMENTS, track_depth};
use crate::error::RenderError;
use crate::options::AssetSize;
use crate::streaming_rewriter::rewrite_str;

/// Opening of every marker. Attribute values never carry it past the
/// sanitizer.
pub(crate) const MARKER_OPEN: &str = "~~~ embed:";

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~~ embed:([A-Za-z0-9_./-]+) ([a-z0-9]+) ~~~").unwrap());

/// What a matcher found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedMetadata {
    /// Provider-specific identifier carried by the marker.
    pub id: String,
    /// The exact substring that gets replaced by the marker.
    pub url: String,
    /// Preview image or canonical page, useful for og:image selection.
    pub image: Option<String>,
    pub link: Option<String>,
}

/// One embeddable provider.
pub trait EmbedMatcher: Send + Sync {
    /// Marker type, unique among registered matchers.
    fn kind(&self) -> &'static str;

    /// Finds the first provider URL in `text`.
    fn embed_metadata(&self, text: &str) -> Option<EmbedMetadata>;

    /// Final markup for a previously extracted id. Returns `None` for ids
    /// this provider could not have produced, which keeps forged markers
    /// inert.
    fn process_embed(&self, id: &str, size: AssetSize) -> Option<String>;
}

/// Ordered list of matchers; first match wins.
pub struct AssetEmbedder {
    matchers: Vec<Box<dyn EmbedMatcher>>,
}

impl AssetEmbedder {
    pub fn new(matchers: Vec<Box<dyn EmbedMatcher>>) -> Self {
        Self { matchers }
    }

    /// YouTube, Vimeo, Twitch, Spotify and 3Speak, in that order. `host` is
    /// the embedding site's domain (Twitch requires it).
    pub fn with_default_matchers(host: &str) -> Self {
        Self::new(vec![
            Box::new(YouTubeMatcher),
            Box::new(VimeoMatcher),
            Box::new(TwitchMatcher::new(host)),
            Box::new(SpotifyMatcher),
            Box::new(ThreeSpeakMatcher),
        ])
    }

    /// First matcher recognising `text`, with its kind.
    pub fn find_embed(&self, text: &str) -> Option<(&'static str, EmbedMetadata)> {
        self.matchers.iter().find_map(|matcher| {
            matcher
                .embed_metadata(text)
                .map(|metadata| (matcher.kind(), metadata))
        })
    }

    pub fn marker(kind: &str, id: &str) -> String {
        format!("{MARKER_OPEN}{id} {kind} ~~~")
    }

    /// Replaces every resolvable marker in the text of `html` with provider
    /// markup. Attribute values and text inside `a`, `code` and `pre` are
    /// left alone.
    pub fn insert_assets(&self, html: &str, size: AssetSize) -> Result<String, RenderError> {
        if !html.contains(MARKER_OPEN) {
            return Ok(html.to_owned());
        }

        let verbatim_depth = Rc::new(Cell::new(0usize));
        let handlers: Vec<_> = VERBATIM_ELEMENTS
            .iter()
            .map(|&selector| {
                let depth = Rc::clone(&verbatim_depth);
                element!(selector, move |el| {
                    track_depth(el, &depth);
                    Ok(())
                })
            })
            .collect();

        let text_handler = {
            let depth = Rc::clone(&verbatim_depth);
            let mut buffer = String::new();

            doc_text!(move |chunk| {
                if chunk.text_type() != TextType::Data || depth.get() > 0 {
                    return Ok(());
                }

                buffer.push_str(chunk.as_str());
                if !chunk.last_in_text_node() {
                    chunk.remove();
                    return Ok(());
                }

                let text = std::mem::take(&mut buffer);
                chunk.replace(&self.resolve_markers(&text, size), ContentType::Html);
                Ok(())
            })
        };

        let mut settings = Settings::default();
        settings.element_content_handlers = handlers;
        settings.document_content_handlers = vec![text_handler];

        rewrite_str(html, settings)
    }

    fn resolve_markers(&self, text: &str, size: AssetSize) -> String {
        MARKER
            .replace_all(text, |caps: &Captures<'_>| {
                let id = &caps[1];
                let kind = &caps[2];
                self.matchers
                    .iter()
                    .find(|matcher| matcher.kind() == kind)
                    .and_then(|matcher| matcher.process_embed(id, size))
                    .unwrap_or_else(|| {
                        tracing::debug!(id, kind, "leaving unresolved embed marker");
                        caps[0].to_owned()
                    })
            })
            .into_owned()
    }
}

/// Shared iframe markup for video-like providers. Attribute order matches
/// what the sanitizer emits, so re-rendering leaves embeds byte-identical.
pub(crate) fn video_iframe(src: &str, size: AssetSize) -> String {
    format!(
        r#"<div class="videoWrapper"><iframe src="{src}" width="{}" height="{}" frameborder="0" allowfullscreen="allowfullscreen" webkitallowfullscreen="webkitallowfullscreen" mozallowfullscreen="mozallowfullscreen"></iframe></div>"#,
        size.width, size.height
    )
}
