//! `> ![Label] hidden` blockquotes rendered as `<details>` blocks.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

use crate::escape::escape_html;
use crate::options::SpoilerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Inside a spoiler; `depth` counts open blockquotes including the
    /// spoiler's own.
    InSpoiler { depth: usize },
}

/// Rewrites spoiler blockquotes in a merged event stream.
///
/// Only the outermost prefixed blockquote becomes a spoiler. Blockquotes
/// nested inside one render as ordinary quotes even when prefixed.
pub(crate) fn apply<'a>(events: Vec<Event<'a>>, options: &SpoilerOptions) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut state = State::Idle;
    let mut events = events.into_iter().peekable();

    while let Some(event) = events.next() {
        match (state, event) {
            (State::Idle, Event::Start(Tag::BlockQuote(kind))) => {
                let opens_spoiler = matches!(events.peek(), Some(Event::Start(Tag::Paragraph)));
                if !opens_spoiler {
                    out.push(Event::Start(Tag::BlockQuote(kind)));
                    continue;
                }

                let paragraph = events.next();
                match events.next() {
                    Some(Event::Text(text)) if text.starts_with(options.prefix) => {
                        let (label, body) = split_label(&text, options);
                        out.push(Event::Html(CowStr::from(format!(
                            "<details><summary>{}</summary>",
                            escape_html(&label)
                        ))));
                        out.extend(paragraph);
                        if body.is_empty() {
                            if matches!(events.peek(), Some(Event::SoftBreak | Event::HardBreak)) {
                                events.next();
                            }
                        } else {
                            out.push(Event::Text(CowStr::from(body.to_owned())));
                        }
                        state = State::InSpoiler { depth: 1 };
                    }
                    other => {
                        out.push(Event::Start(Tag::BlockQuote(kind)));
                        out.extend(paragraph);
                        out.extend(other);
                    }
                }
            }
            (State::InSpoiler { depth }, event @ Event::Start(Tag::BlockQuote(_))) => {
                state = State::InSpoiler { depth: depth + 1 };
                out.push(event);
            }
            (State::InSpoiler { depth: 1 }, Event::End(TagEnd::BlockQuote(_))) => {
                state = State::Idle;
                out.push(Event::Html(CowStr::Borrowed("</details>\n")));
            }
            (State::InSpoiler { depth }, event @ Event::End(TagEnd::BlockQuote(_))) => {
                state = State::InSpoiler { depth: depth - 1 };
                out.push(event);
            }
            (_, event) => out.push(event),
        }
    }

    out
}

/// Splits `!…` into the summary label and the remaining body text.
fn split_label<'t>(text: &'t str, options: &SpoilerOptions) -> (String, &'t str) {
    let rest = &text[options.prefix.len_utf8()..];

    if let Some(inner) = rest.strip_prefix('[') {
        if let Some(close) = inner.find(']') {
            let label = inner[..close].trim();
            let len = label.chars().count();
            if (1..=options.max_label_length).contains(&len) {
                return (label.to_owned(), inner[close + 1..].trim_start());
            }
        }
    }

    (options.default_label.clone(), rest.trim_start())
}
