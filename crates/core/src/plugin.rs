//! Caller-supplied text transforms around the pipeline.

/// A pair of pure text transforms.
///
/// `pre_process` sees the raw body before any sanitization; `post_process`
/// sees the final HTML. Both default to the identity.
pub trait RendererPlugin: Send + Sync {
    fn pre_process(&self, text: &str) -> String {
        text.to_owned()
    }

    fn post_process(&self, html: &str) -> String {
        html.to_owned()
    }
}

pub(crate) fn run_pre_process(plugins: &[Box<dyn RendererPlugin>], text: &str) -> String {
    plugins
        .iter()
        .fold(text.to_owned(), |acc, plugin| plugin.pre_process(&acc))
}

pub(crate) fn run_post_process(plugins: &[Box<dyn RendererPlugin>], html: &str) -> String {
    plugins
        .iter()
        .fold(html.to_owned(), |acc, plugin| plugin.post_process(&acc))
}
