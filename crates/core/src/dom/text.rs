//! Text-node rewriting: embed markers, bare URLs, hashtags and mentions.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Collected;
use crate::embedder::AssetEmbedder;
use crate::escape::escape_html;
use crate::localization::validate_account_name;
use crate::options::RendererOptions;

/// Upper bound on embeds extracted from one text node.
const MAX_EMBEDS_PER_NODE: usize = 32;

static LINKABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)(?P<url>https?://[^\s<>"'`]+)"#,
        r"|(?P<tag_lead>^|[\s(>])#(?P<tag>[a-z0-9-]+)",
        r"|(?P<user_lead>^|[^\w!#$%&*@/.+~-])@(?P<user>[a-z][a-z0-9.-]*[a-z0-9])",
    ))
    .unwrap()
});
static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?:jpe?g|gif|png|webp|avif|svg)(?:\?[^\s]*)?$").unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

pub(super) struct TextTransformer<'r> {
    options: &'r RendererOptions,
    embedder: &'r AssetEmbedder,
}

impl<'r> TextTransformer<'r> {
    pub(super) fn new(options: &'r RendererOptions, embedder: &'r AssetEmbedder) -> Self {
        Self { options, embedder }
    }

    /// `text` is raw HTML text (entities intact); so is the result.
    pub(super) fn transform(&self, text: &str, collected: &mut Collected) -> String {
        let text = self.extract_embeds(text, collected);
        LINKABLE
            .replace_all(&text, |caps: &Captures<'_>| self.linkify(caps, collected))
            .into_owned()
    }

    fn extract_embeds(&self, text: &str, collected: &mut Collected) -> String {
        let mut text = text.to_owned();

        for _ in 0..MAX_EMBEDS_PER_NODE {
            let Some((kind, metadata)) = self.embedder.find_embed(&text) else {
                break;
            };
            if metadata.url.is_empty() || !text.contains(&metadata.url) {
                break;
            }

            let marker = AssetEmbedder::marker(kind, &metadata.id);
            text = text.replacen(&metadata.url, &marker, 1);
            collected.images.extend(metadata.image);
            collected.links.extend(metadata.link);
        }

        text
    }

    fn linkify(&self, caps: &Captures<'_>, collected: &mut Collected) -> String {
        if let Some(url) = caps.name("url") {
            return self.link_url(url.as_str(), collected);
        }

        if let Some(tag) = caps.name("tag") {
            let lead = caps.name("tag_lead").map_or("", |m| m.as_str());
            let tag = tag.as_str();
            if tag.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
                return caps[0].to_owned();
            }
            let href = (self.options.hashtag_url_fn)(&tag.to_ascii_lowercase());
            return format!(r#"{lead}<a href="{}">#{tag}</a>"#, escape_html(&href));
        }

        if let Some(user) = caps.name("user") {
            let lead = caps.name("user_lead").map_or("", |m| m.as_str());
            let account = user.as_str().to_ascii_lowercase();
            if validate_account_name(&account, &self.options.localization).is_some() {
                return caps[0].to_owned();
            }
            let href = (self.options.usertag_url_fn)(&account);
            return format!(
                r#"{lead}<a href="{}">@{}</a>"#,
                escape_html(&href),
                user.as_str()
            );
        }

        caps[0].to_owned()
    }

    fn link_url(&self, raw: &str, collected: &mut Collected) -> String {
        let url = raw.trim_end_matches(TRAILING_PUNCTUATION);
        let tail = &raw[url.len()..];
        let decoded = url.replace("&amp;", "&");

        if IMAGE_URL.is_match(&decoded) && !self.options.do_not_show_images {
            let src = (self.options.image_proxy_fn)(&decoded);
            let html = format!(r#"<img src="{}" />{tail}"#, escape_html(&src));
            collected.images.push(src);
            return html;
        }

        let html = format!(
            r#"<a href="{href}">{href}</a>{tail}"#,
            href = escape_html(&decoded)
        );
        collected.links.push(decoded);
        html
    }
}
