use pulldown_cmark::{Event, html};
use std::io::{self, Write};

/// Streams a pulldown-cmark event iterator into any [`io::Write`] as HTML.
///
/// The markdown converter drives it into a byte buffer; a
/// [`crate::streaming_rewriter::StreamingRewriter`] works as a target too.
pub struct PipeAdapter<W> {
    writer: W,
}

impl<W: Write> PipeAdapter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes every event and flushes the writer.
    pub fn drive<'a, I>(self, events: I) -> io::Result<()>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut writer = self.writer;
        html::write_html_io(&mut writer, events)?;
        writer.flush()
    }
}
