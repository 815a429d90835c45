use hivemark_core::{RenderReport, Renderer, RendererConfig, RendererOptions};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

/// Renders a post body for client-side previews.
///
/// `config` is a plain object with the same fields as the JSON config
/// (`{ baseUrl: "https://hive.blog", ... }`). A missing body renders to `""`.
#[wasm_bindgen(js_name = render_post_body)]
pub fn render_post_body(body: Option<String>, config: JsValue) -> Result<String, JsError> {
    renderer(config)?
        .render_post_body(body.as_deref().unwrap_or_default())
        .map_err(to_js_error)
}

/// Renders a comment body; same contract as `render_post_body`.
#[wasm_bindgen(js_name = render_comment_body)]
pub fn render_comment_body(body: Option<String>, config: JsValue) -> Result<String, JsError> {
    renderer(config)?
        .render_comment_body(body.as_deref().unwrap_or_default())
        .map_err(to_js_error)
}

/// Renders a body and returns `{ html, images, links, issues }`, where
/// `issues` lists what the sanitizer had to replace.
#[wasm_bindgen(js_name = render_report)]
pub fn render_report(body: Option<String>, config: JsValue) -> Result<Object, JsError> {
    let report = renderer(config)?
        .render_report(body.as_deref().unwrap_or_default(), None)
        .map_err(to_js_error)?;
    report_object(&report).map_err(js_value_error)
}

/// Whether `text` would be treated as HTML rather than markdown.
#[wasm_bindgen(js_name = is_html)]
pub fn is_html(text: &str) -> bool {
    hivemark_core::is_html(text)
}

fn renderer(config: JsValue) -> Result<Renderer, JsError> {
    let config: RendererConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
    let options = RendererOptions::from_config(config).map_err(to_js_error)?;
    Renderer::new(options).map_err(to_js_error)
}

fn report_object(report: &RenderReport) -> Result<Object, JsValue> {
    let object = Object::new();
    Reflect::set(&object, &"html".into(), &JsValue::from_str(&report.html))?;
    Reflect::set(&object, &"images".into(), &string_array(&report.images))?;
    Reflect::set(&object, &"links".into(), &string_array(&report.links))?;

    let issues: Vec<String> = report
        .sanitization_issues
        .iter()
        .map(ToString::to_string)
        .collect();
    Reflect::set(&object, &"issues".into(), &string_array(&issues))?;
    Ok(object)
}

fn string_array(items: &[String]) -> Array {
    items.iter().map(|item| JsValue::from_str(item)).collect()
}

fn to_js_error<E: ToString>(err: E) -> JsError {
    JsError::new(&err.to_string())
}

fn js_value_error(err: JsValue) -> JsError {
    let message = err
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(&err)
                .ok()
                .and_then(|s| s.as_string())
        })
        .unwrap_or_else(|| "failed to build report object".to_string());
    JsError::new(&message)
}
