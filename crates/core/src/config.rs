//! Data-only renderer configuration, loadable from JSON or a JS object.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::localization::LocalizationOptions;
use crate::options::{RendererOptions, SpoilerOptions, host_of};

/// Serialisable view of [`RendererOptions`] without the injected functions.
///
/// Host applications (and the napi/wasm bindings) assemble this once at
/// startup; [`RendererOptions::from_config`] turns it into validated options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_true")]
    pub breaks: bool,
    #[serde(default)]
    pub skip_sanitization: bool,
    #[serde(default)]
    pub allow_insecure_script_tags: bool,
    #[serde(default = "default_true")]
    pub add_nofollow_to_links: bool,
    #[serde(default = "default_true")]
    pub add_target_blank_to_links: bool,
    #[serde(default = "default_internal_class")]
    pub css_class_for_internal_links: Option<String>,
    #[serde(default = "default_external_class")]
    pub css_class_for_external_links: Option<String>,
    #[serde(default)]
    pub do_not_show_images: bool,
    #[serde(default)]
    pub ipfs_prefix: String,
    #[serde(default = "default_assets_width")]
    pub assets_width: u32,
    #[serde(default = "default_assets_height")]
    pub assets_height: u32,
    /// Image proxy root, e.g. `https://images.hive.blog/`. Proxied URLs look
    /// like `{prefix}0x0/{original}`.
    #[serde(default)]
    pub image_proxy_prefix: Option<String>,
    #[serde(default)]
    pub spoiler_prefix: Option<char>,
    #[serde(default)]
    pub spoiler_default_label: Option<String>,
    #[serde(default)]
    pub localization: LocalizationOptions,
}

fn default_true() -> bool {
    true
}

fn default_internal_class() -> Option<String> {
    Some("link-internal".to_owned())
}

fn default_external_class() -> Option<String> {
    Some("link-external".to_owned())
}

fn default_assets_width() -> u32 {
    640
}

fn default_assets_height() -> u32 {
    480
}

impl RendererConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl RendererOptions {
    /// Validates a [`RendererConfig`], using the default link and URL
    /// functions (plus the prefix-based image proxy when configured).
    pub fn from_config(config: RendererConfig) -> Result<RendererOptions, ConfigError> {
        let base_url = config
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingField("base_url"))?;

        let mut spoiler = SpoilerOptions::default();
        if let Some(prefix) = config.spoiler_prefix {
            spoiler.prefix = prefix;
        }
        if let Some(label) = config.spoiler_default_label {
            spoiler.default_label = label;
        }

        let mut builder = RendererOptions::builder(base_url)
            .breaks(config.breaks)
            .skip_sanitization(config.skip_sanitization)
            .allow_insecure_script_tags(config.allow_insecure_script_tags)
            .add_nofollow_to_links(config.add_nofollow_to_links)
            .add_target_blank_to_links(config.add_target_blank_to_links)
            .css_class_for_internal_links(config.css_class_for_internal_links)
            .css_class_for_external_links(config.css_class_for_external_links)
            .do_not_show_images(config.do_not_show_images)
            .ipfs_prefix(config.ipfs_prefix)
            .assets_size(config.assets_width, config.assets_height)
            .spoiler(spoiler)
            .localization(config.localization);

        if let Some(prefix) = config.image_proxy_prefix {
            let prefix = prefix.trim().trim_end_matches('/').to_owned();
            if host_of(&prefix).is_none() {
                return Err(ConfigError::invalid(
                    "image_proxy_prefix",
                    format!("`{prefix}` is not an absolute http(s) URL"),
                ));
            }
            builder = builder.image_proxy_fn(move |url: &str| proxify(&prefix, url));
        }

        builder.build()
    }
}

/// Routes absolute images through the proxy; anything else is left for the
/// sanitizer to judge.
fn proxify(prefix: &str, url: &str) -> String {
    if url.starts_with(prefix) {
        return url.to_owned();
    }
    if host_of(url).is_some() {
        format!("{prefix}/0x0/{url}")
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("{prefix}/0x0/https://{rest}")
    } else {
        url.to_owned()
    }
}
