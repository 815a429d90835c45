//! Fenced code blocks highlighted with syntect's classed HTML generator.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::escape::escape_html;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Token classes come out as `hljs-keyword`, `hljs-string`, …
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

struct CodeBlock {
    language: Option<String>,
    code: String,
}

/// Collapses every code block into a single pre-rendered `Html` event.
pub(crate) fn highlight_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut block: Option<CodeBlock> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                block = Some(CodeBlock {
                    language: language(&kind),
                    code: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = block.take() {
                    let html = render_block(block.language.as_deref(), &block.code);
                    out.push(Event::Html(CowStr::from(html)));
                }
            }
            Event::Text(text) if block.is_some() => {
                if let Some(block) = block.as_mut() {
                    block.code.push_str(&text);
                }
            }
            other => out.push(other),
        }
    }

    out
}

/// First word of the fence info string, restricted to characters that are
/// safe inside a class attribute.
fn language(kind: &CodeBlockKind<'_>) -> Option<String> {
    let CodeBlockKind::Fenced(info) = kind else {
        return None;
    };
    let token: String = info
        .split_whitespace()
        .next()?
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '#' | '-'))
        .collect();
    (!token.is_empty()).then_some(token)
}

fn render_block(language: Option<&str>, code: &str) -> String {
    let syntax = match language {
        Some(language) => SYNTAXES.find_syntax_by_token(language),
        None => SYNTAXES.find_syntax_by_first_line(code),
    };

    match syntax.and_then(|syntax| highlight(syntax, code)) {
        Some(highlighted) => {
            let class = match language {
                Some(language) => format!("language-{language} hljs"),
                None => "hljs".to_owned(),
            };
            format!("<pre><code class=\"{class}\">{highlighted}</code></pre>\n")
        }
        None => match language {
            Some(language) => format!(
                "<pre><code class=\"language-{language}\">{}</code></pre>\n",
                escape_html(code)
            ),
            None => format!("<pre><code>{}</code></pre>\n", escape_html(code)),
        },
    }
}

fn highlight(syntax: &SyntaxReference, code: &str) -> Option<String> {
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);

    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(syntax = %syntax.name, error = %err, "highlighting failed, emitting plain code");
            return None;
        }
    }

    Some(generator.finalize())
}
