//! `io::Write` front end for lol_html so HTML can be streamed through a
//! rewrite pass without an intermediate buffer.

use lol_html::errors::RewritingError;
use lol_html::{HtmlRewriter, OutputSink, Settings};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::error::RenderError;

/// Runs one rewrite pass over `html` and returns the rewritten document.
pub(crate) fn rewrite_str(html: &str, settings: Settings<'_, '_>) -> Result<String, RenderError> {
    let mut rewriter = StreamingRewriter::new(Vec::with_capacity(html.len()), settings);
    rewriter.write_all(html.as_bytes())?;
    let bytes = rewriter.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

/// Implements [`Write`] so the `PipeAdapter` (or a plain `write_all`) can push
/// raw HTML directly into lol_html.
///
/// The destination writer is shared with lol_html's [`OutputSink`] through a
/// single `Rc<RefCell<Option<W>>>`; sink write failures are parked in
/// `sink_error` and surfaced on the next call.
pub struct StreamingRewriter<'h, W: Write> {
    rewriter: Option<HtmlRewriter<'h, OutputProxy<W>>>,
    target: Rc<RefCell<Option<W>>>,
    sink_error: Rc<RefCell<Option<io::Error>>>,
}

impl<'h, W: Write> StreamingRewriter<'h, W> {
    /// Creates a rewriter that applies `settings` and forwards the output into
    /// `writer`.
    pub fn new(writer: W, settings: Settings<'h, '_>) -> Self {
        let target = Rc::new(RefCell::new(Some(writer)));
        let sink_error = Rc::new(RefCell::new(None));
        let output_sink = OutputProxy::new(Rc::clone(&target), Rc::clone(&sink_error));
        let rewriter = HtmlRewriter::new(settings, output_sink);

        Self {
            rewriter: Some(rewriter),
            target,
            sink_error,
        }
    }

    /// Consumes the rewriter, ensures lol_html has flushed, and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.finalize_if_needed()?;

        let cell = Rc::try_unwrap(self.target)
            .map_err(|_| io::Error::other("rewriter still borrowed"))?;

        cell.into_inner()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "writer missing"))
    }

    fn finalize_if_needed(&mut self) -> io::Result<()> {
        if let Some(rewriter) = self.rewriter.take() {
            rewriter.end().map_err(rewriting_error_to_io)?;
        }

        Self::take_sink_error(&self.sink_error)
    }

    fn take_sink_error(cell: &Rc<RefCell<Option<io::Error>>>) -> io::Result<()> {
        match cell.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<W: Write> Write for StreamingRewriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let rewriter = self
            .rewriter
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "rewriter finalized"))?;

        rewriter.write(buf).map_err(rewriting_error_to_io)?;
        Self::take_sink_error(&self.sink_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.finalize_if_needed()
    }
}

/// Handler failures and memory-limit errors travel through `io::Error` so
/// the markdown writer and the rewriter share one error path.
fn rewriting_error_to_io(err: RewritingError) -> io::Error {
    io::Error::other(err)
}

struct OutputProxy<W: Write> {
    target: Rc<RefCell<Option<W>>>,
    sink_error: Rc<RefCell<Option<io::Error>>>,
}

impl<W: Write> OutputProxy<W> {
    fn new(target: Rc<RefCell<Option<W>>>, sink_error: Rc<RefCell<Option<io::Error>>>) -> Self {
        OutputProxy { target, sink_error }
    }
}

impl<W: Write> OutputSink for OutputProxy<W> {
    fn handle_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() || self.sink_error.borrow().is_some() {
            return;
        }

        if let Some(writer) = self.target.borrow_mut().as_mut() {
            if let Err(err) = writer.write_all(chunk) {
                *self.sink_error.borrow_mut() = Some(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lol_html::element;
    use pretty_assertions::assert_eq;

    fn strip_classes() -> Settings<'static, 'static> {
        let mut settings = Settings::default();
        settings.element_content_handlers = vec![element!("*", |el| {
            el.remove_attribute("class");
            Ok(())
        })];
        settings
    }

    #[test]
    fn rewrites_whole_documents() {
        assert_eq!(
            rewrite_str(r#"<html><p class="x">hi</p></html>"#, strip_classes()).unwrap(),
            "<html><p>hi</p></html>"
        );
    }

    #[test]
    fn accepts_split_writes() {
        let mut rewriter = StreamingRewriter::new(Vec::new(), strip_classes());
        rewriter.write_all(br#"<p cla"#).unwrap();
        rewriter.write_all(br#"ss="x">split</p>"#).unwrap();
        let output = String::from_utf8(rewriter.into_inner().unwrap()).unwrap();

        assert_eq!(output, "<p>split</p>");
    }

    #[test]
    fn surfaces_handler_errors() {
        let mut settings = Settings::default();
        settings.element_content_handlers = vec![element!("img", |_el| {
            Err("refused".into())
        })];

        assert!(matches!(
            rewrite_str("<img src=x>", settings),
            Err(RenderError::Io(_))
        ));
    }
}
