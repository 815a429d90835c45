//! Markdown to HTML with spoiler blocks and highlighted code.

mod highlight;
mod spoiler;

use pulldown_cmark::{Event, Options, Parser, TextMergeStream};

use crate::adapter::PipeAdapter;
use crate::error::RenderError;
use crate::options::SpoilerOptions;

/// pulldown-cmark configured for post bodies.
///
/// Raw HTML passes through untouched (the sanitizer deals with it later),
/// quotes stay straight, and with `breaks` every single newline becomes a
/// `<br />`.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    breaks: bool,
    spoiler: SpoilerOptions,
}

impl MarkdownConverter {
    pub fn new(breaks: bool, spoiler: SpoilerOptions) -> Self {
        Self { breaks, spoiler }
    }

    pub fn to_html(&self, markdown: &str) -> Result<String, RenderError> {
        let parser = Parser::new_ext(markdown, parser_options());
        let events: Vec<Event<'_>> = TextMergeStream::new(parser)
            .map(|event| match event {
                Event::SoftBreak if self.breaks => Event::HardBreak,
                other => other,
            })
            .collect();

        let events = spoiler::apply(events, &self.spoiler);
        let events = highlight::highlight_code_blocks(events);

        let mut buffer = Vec::with_capacity(markdown.len() * 3 / 2);
        PipeAdapter::new(&mut buffer).drive(events.into_iter())?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn converter() -> MarkdownConverter {
        MarkdownConverter::new(true, SpoilerOptions::default())
    }

    #[test]
    fn renders_basic_markdown() {
        let html = converter().to_html("# Title\n\n* one\n* two").unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn single_newlines_become_breaks() {
        assert_eq!(
            converter().to_html("first\nsecond").unwrap(),
            "<p>first<br />\nsecond</p>\n"
        );

        let no_breaks = MarkdownConverter::new(false, SpoilerOptions::default());
        assert_eq!(
            no_breaks.to_html("first\nsecond").unwrap(),
            "<p>first\nsecond</p>\n"
        );
    }

    #[test]
    fn keeps_quotes_straight() {
        let html = converter().to_html("\"quoted\" and 'single'").unwrap();
        assert!(html.contains("&quot;quoted&quot;") || html.contains("\"quoted\""));
        assert!(!html.contains('\u{201c}'));
    }

    #[test]
    fn passes_raw_html_through() {
        let html = converter().to_html("<center>hi</center>").unwrap();
        assert!(html.contains("<center>hi</center>"));
    }

    #[test]
    fn supports_tables_and_strikethrough() {
        let html = converter()
            .to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~")
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn renders_spoilers() {
        let html = converter().to_html("> ! hidden text").unwrap();
        assert!(html.starts_with("<details><summary>Reveal spoiler</summary>"));
        assert!(html.contains("hidden text"));
    }
}
