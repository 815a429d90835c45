#![deny(missing_docs)]
//! Node.js bindings used by the Astro front end at request and build time.

use hivemark_core::{Renderer, RendererConfig, RendererOptions};
use napi::{Error, Result};
use napi_derive::napi;

/// Returns the version string reported by the core crate.
#[napi]
pub fn version() -> String {
    hivemark_core::version().to_string()
}

/// Renders a post body. `configJson` is a JSON-encoded renderer config
/// (`{"baseUrl": "https://hive.blog", ...}`); a missing body renders to `""`.
#[napi]
pub fn render_post_body(body: Option<String>, config_json: String) -> Result<String> {
    let renderer = renderer(&config_json)?;
    renderer
        .render_post_body(body.as_deref().unwrap_or_default())
        .map_err(to_napi_error)
}

/// Renders a comment body; same contract as `renderPostBody`.
#[napi]
pub fn render_comment_body(body: Option<String>, config_json: String) -> Result<String> {
    let renderer = renderer(&config_json)?;
    renderer
        .render_comment_body(body.as_deref().unwrap_or_default())
        .map_err(to_napi_error)
}

/// Whether `text` would be treated as HTML rather than markdown.
#[napi]
pub fn is_html(text: String) -> bool {
    hivemark_core::is_html(&text)
}

fn renderer(config_json: &str) -> Result<Renderer> {
    let config = RendererConfig::from_json(config_json).map_err(to_napi_error)?;
    let options = RendererOptions::from_config(config).map_err(to_napi_error)?;
    Renderer::new(options).map_err(to_napi_error)
}

fn to_napi_error<E: ToString>(err: E) -> Error {
    Error::from_reason(err.to_string())
}
