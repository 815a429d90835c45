//! The DOM pass: one lol_html rewrite over the wrapped document that
//! proxies images, rewrites IPFS links, defuses disguised links and turns
//! text into links, mentions, hashtags and embed markers.

mod phishing;
mod text;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use lol_html::html_content::{ContentType, Element, EndTag, TextType};
use lol_html::{HandlerResult, Settings, doc_text, element};

use crate::embedder::AssetEmbedder;
use crate::error::RenderError;
use crate::escape::escape_html;
use crate::options::RendererOptions;
use crate::streaming_rewriter::rewrite_str;

use self::text::TextTransformer;

/// Elements whose text is never linkified or scanned for embeds.
pub(crate) const VERBATIM_ELEMENTS: [&str; 3] = ["a", "code", "pre"];

/// Output of [`DomParser::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub html: String,
    /// Image sources after proxying, plus embed preview images.
    pub images: Vec<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub(crate) images: Vec<String>,
    pub(crate) links: Vec<String>,
}

pub struct DomParser<'r> {
    options: &'r RendererOptions,
    embedder: &'r AssetEmbedder,
}

impl<'r> DomParser<'r> {
    pub fn new(options: &'r RendererOptions, embedder: &'r AssetEmbedder) -> Self {
        Self { options, embedder }
    }

    pub fn parse(&self, html: &str) -> Result<ParsedDocument, RenderError> {
        let collected = Rc::new(RefCell::new(Collected::default()));
        let verbatim_depth = Rc::new(Cell::new(0usize));
        let suspicious = phishing::suspicious_links(html, self.options.host());

        let mut handlers: Vec<_> = VERBATIM_ELEMENTS
            .iter()
            .map(|&selector| {
                let depth = Rc::clone(&verbatim_depth);
                element!(selector, move |el| {
                    track_depth(el, &depth);
                    Ok(())
                })
            })
            .collect();

        handlers.push(element!("img", {
            let collected = Rc::clone(&collected);
            move |el| self.rewrite_image(el, &collected)
        }));
        handlers.push(element!("a[href]", {
            let collected = Rc::clone(&collected);
            move |el| self.rewrite_link(el, &suspicious, &collected)
        }));

        let text_handler = {
            let collected = Rc::clone(&collected);
            let depth = Rc::clone(&verbatim_depth);
            let transformer = TextTransformer::new(self.options, self.embedder);
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
                let transformed = transformer.transform(&text, &mut collected.borrow_mut());
                chunk.replace(&transformed, ContentType::Html);
                Ok(())
            })
        };

        let mut settings = Settings::default();
        settings.element_content_handlers = handlers;
        settings.document_content_handlers = vec![text_handler];

        let html = rewrite_str(html, settings)?;
        let collected = collected.take();

        Ok(ParsedDocument {
            html,
            images: collected.images,
            links: collected.links,
        })
    }

    fn rewrite_image(&self, el: &mut Element<'_, '_>, collected: &RefCell<Collected>) -> HandlerResult {
        if self.options.do_not_show_images {
            let placeholder = format!("<div>{}</div>", escape_html(&self.options.localization.no_image));
            el.replace(&placeholder, ContentType::Html);
            return Ok(());
        }

        let Some(src) = el.get_attribute("src") else {
            return Ok(());
        };
        let src = rewrite_ipfs(&src, &self.options.ipfs_prefix).unwrap_or(src);
        let src = (self.options.image_proxy_fn)(&src);
        el.set_attribute("src", &src)?;
        collected.borrow_mut().images.push(src);
        Ok(())
    }

    fn rewrite_link(
        &self,
        el: &mut Element<'_, '_>,
        suspicious: &HashMap<String, String>,
        collected: &RefCell<Collected>,
    ) -> HandlerResult {
        let Some(href) = el.get_attribute("href") else {
            return Ok(());
        };

        if let Some(text) = suspicious.get(&href) {
            tracing::debug!(href = %href, text = %text, "defusing link with misleading text");
            defuse_link(el, &self.options.localization.phishing_warning, text, &href)?;
            return Ok(());
        }

        let href = match rewrite_ipfs(&href, &self.options.ipfs_prefix) {
            Some(rewritten) => {
                el.set_attribute("href", &rewritten)?;
                rewritten
            }
            None => href,
        };
        collected.borrow_mut().links.push(href);
        Ok(())
    }
}

/// Counts open verbatim elements; the count drops again at their end tag.
pub(crate) fn track_depth(el: &mut Element<'_, '_>, depth: &Rc<Cell<usize>>) {
    if let Some(handlers) = el.end_tag_handlers() {
        depth.set(depth.get() + 1);
        let depth = Rc::clone(depth);
        handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
            depth.set(depth.get().saturating_sub(1));
            Ok(())
        }));
    }
}

/// Turns the anchor into a warning box showing both the text and the real
/// destination. The element is renamed rather than replaced so its end tag
/// (and the verbatim depth bookkeeping on it) survives.
fn defuse_link(el: &mut Element<'_, '_>, warning: &str, text: &str, href: &str) -> HandlerResult {
    let names: Vec<String> = el.attributes().iter().map(|attr| attr.name()).collect();
    for name in names {
        el.remove_attribute(&name);
    }

    el.set_tag_name("div")?;
    el.set_attribute("title", &escape_html(warning))?;
    el.set_attribute("class", "phishy")?;
    el.set_inner_content(&format!("{text} / {}", escape_html(href)), ContentType::Html);
    Ok(())
}

/// `ipfs://CID` and `/ipfs/CID` served from the configured gateway.
pub(crate) fn rewrite_ipfs(url: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let cid = url
        .strip_prefix("ipfs://")
        .or_else(|| url.strip_prefix("/ipfs/"))?;
    Some(format!("{prefix}/{cid}"))
}
