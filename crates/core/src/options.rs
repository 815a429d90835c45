//! Immutable renderer configuration and its validating builder.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::localization::LocalizationOptions;
use crate::plugin::RendererPlugin;

/// Maps one URL or name to another URL (image proxy, user/tag pages).
pub type UrlFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Decides a link policy question for one `href`.
pub type LinkPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Pixel size of embedded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetSize {
    pub width: u32,
    pub height: u32,
}

/// Spoiler block syntax: `> ![Label] hidden text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoilerOptions {
    /// Character that opens a spoiler blockquote.
    pub prefix: char,
    /// Summary used when no `[Label]` is given.
    pub default_label: String,
    pub max_label_length: usize,
}

impl Default for SpoilerOptions {
    fn default() -> Self {
        Self {
            prefix: '!',
            default_label: "Reveal spoiler".to_owned(),
            max_label_length: 64,
        }
    }
}

/// Fully validated renderer configuration.
///
/// Only obtainable through [`RendererOptions::builder`] (or
/// [`RendererOptions::from_config`]), so the render path never re-checks it.
pub struct RendererOptions {
    pub(crate) base_url: String,
    pub(crate) breaks: bool,
    pub(crate) skip_sanitization: bool,
    pub(crate) allow_insecure_script_tags: bool,
    pub(crate) add_nofollow_to_links: bool,
    pub(crate) add_target_blank_to_links: bool,
    pub(crate) css_class_for_internal_links: Option<String>,
    pub(crate) css_class_for_external_links: Option<String>,
    pub(crate) do_not_show_images: bool,
    pub(crate) ipfs_prefix: String,
    pub(crate) assets: AssetSize,
    pub(crate) spoiler: SpoilerOptions,
    pub(crate) localization: LocalizationOptions,
    pub(crate) plugins: Vec<Box<dyn RendererPlugin>>,
    pub(crate) image_proxy_fn: UrlFn,
    pub(crate) usertag_url_fn: UrlFn,
    pub(crate) hashtag_url_fn: UrlFn,
    pub(crate) is_link_safe_fn: LinkPredicate,
    pub(crate) add_external_css_class_to_matching_links_fn: LinkPredicate,
}

impl RendererOptions {
    pub fn builder(base_url: impl Into<String>) -> RendererOptionsBuilder {
        RendererOptionsBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn assets(&self) -> AssetSize {
        self.assets
    }

    pub fn localization(&self) -> &LocalizationOptions {
        &self.localization
    }

    /// Host part of the base URL, used where providers require the embedding
    /// domain (Twitch's `parent`).
    pub(crate) fn host(&self) -> &str {
        host_of(&self.base_url).unwrap_or_default()
    }
}

impl fmt::Debug for RendererOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererOptions")
            .field("base_url", &self.base_url)
            .field("breaks", &self.breaks)
            .field("skip_sanitization", &self.skip_sanitization)
            .field("allow_insecure_script_tags", &self.allow_insecure_script_tags)
            .field("add_nofollow_to_links", &self.add_nofollow_to_links)
            .field("add_target_blank_to_links", &self.add_target_blank_to_links)
            .field(
                "css_class_for_internal_links",
                &self.css_class_for_internal_links,
            )
            .field(
                "css_class_for_external_links",
                &self.css_class_for_external_links,
            )
            .field("do_not_show_images", &self.do_not_show_images)
            .field("ipfs_prefix", &self.ipfs_prefix)
            .field("assets", &self.assets)
            .field("spoiler", &self.spoiler)
            .field("plugins", &self.plugins.len())
            .finish_non_exhaustive()
    }
}

/// Collects options and validates all of them in [`build`](Self::build).
pub struct RendererOptionsBuilder {
    base_url: String,
    breaks: bool,
    skip_sanitization: bool,
    allow_insecure_script_tags: bool,
    add_nofollow_to_links: bool,
    add_target_blank_to_links: bool,
    css_class_for_internal_links: Option<String>,
    css_class_for_external_links: Option<String>,
    do_not_show_images: bool,
    ipfs_prefix: String,
    assets: AssetSize,
    spoiler: SpoilerOptions,
    localization: LocalizationOptions,
    plugins: Vec<Box<dyn RendererPlugin>>,
    image_proxy_fn: Option<UrlFn>,
    usertag_url_fn: Option<UrlFn>,
    hashtag_url_fn: Option<UrlFn>,
    is_link_safe_fn: Option<LinkPredicate>,
    add_external_css_class_to_matching_links_fn: Option<LinkPredicate>,
}

impl RendererOptionsBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            breaks: true,
            skip_sanitization: false,
            allow_insecure_script_tags: false,
            add_nofollow_to_links: true,
            add_target_blank_to_links: true,
            css_class_for_internal_links: Some("link-internal".to_owned()),
            css_class_for_external_links: Some("link-external".to_owned()),
            do_not_show_images: false,
            ipfs_prefix: String::new(),
            assets: AssetSize {
                width: 640,
                height: 480,
            },
            spoiler: SpoilerOptions::default(),
            localization: LocalizationOptions::default(),
            plugins: Vec::new(),
            image_proxy_fn: None,
            usertag_url_fn: None,
            hashtag_url_fn: None,
            is_link_safe_fn: None,
            add_external_css_class_to_matching_links_fn: None,
        }
    }

    /// Turn single newlines into `<br />` (default on).
    #[must_use]
    pub fn breaks(mut self, enabled: bool) -> Self {
        self.breaks = enabled;
        self
    }

    #[must_use]
    pub fn skip_sanitization(mut self, skip: bool) -> Self {
        self.skip_sanitization = skip;
        self
    }

    #[must_use]
    pub fn allow_insecure_script_tags(mut self, allow: bool) -> Self {
        self.allow_insecure_script_tags = allow;
        self
    }

    #[must_use]
    pub fn add_nofollow_to_links(mut self, enabled: bool) -> Self {
        self.add_nofollow_to_links = enabled;
        self
    }

    #[must_use]
    pub fn add_target_blank_to_links(mut self, enabled: bool) -> Self {
        self.add_target_blank_to_links = enabled;
        self
    }

    #[must_use]
    pub fn css_class_for_internal_links(mut self, class: Option<String>) -> Self {
        self.css_class_for_internal_links = class;
        self
    }

    #[must_use]
    pub fn css_class_for_external_links(mut self, class: Option<String>) -> Self {
        self.css_class_for_external_links = class;
        self
    }

    #[must_use]
    pub fn do_not_show_images(mut self, hide: bool) -> Self {
        self.do_not_show_images = hide;
        self
    }

    /// Gateway used for `ipfs://` and `/ipfs/` links; empty disables the
    /// rewrite.
    #[must_use]
    pub fn ipfs_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ipfs_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn assets_size(mut self, width: u32, height: u32) -> Self {
        self.assets = AssetSize { width, height };
        self
    }

    #[must_use]
    pub fn spoiler(mut self, spoiler: SpoilerOptions) -> Self {
        self.spoiler = spoiler;
        self
    }

    #[must_use]
    pub fn localization(mut self, localization: LocalizationOptions) -> Self {
        self.localization = localization;
        self
    }

    #[must_use]
    pub fn plugin(mut self, plugin: impl RendererPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    #[must_use]
    pub fn image_proxy_fn(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.image_proxy_fn = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn usertag_url_fn(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.usertag_url_fn = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn hashtag_url_fn(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.hashtag_url_fn = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn is_link_safe_fn(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.is_link_safe_fn = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn add_external_css_class_to_matching_links_fn(
        mut self,
        f: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.add_external_css_class_to_matching_links_fn = Some(Arc::new(f));
        self
    }

    /// Validates every option, filling unset functions with defaults derived
    /// from the base URL.
    pub fn build(self) -> Result<RendererOptions, ConfigError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ConfigError::MissingField("base_url"));
        }
        if host_of(&base_url).is_none() {
            return Err(ConfigError::invalid(
                "base_url",
                format!("`{base_url}` is not an absolute http(s) URL"),
            ));
        }

        if self.assets.width == 0 {
            return Err(ConfigError::invalid("assets_width", "must be positive"));
        }
        if self.assets.height == 0 {
            return Err(ConfigError::invalid("assets_height", "must be positive"));
        }

        let ipfs_prefix = self.ipfs_prefix.trim().trim_end_matches('/').to_owned();
        if !ipfs_prefix.is_empty() && host_of(&ipfs_prefix).is_none() {
            return Err(ConfigError::invalid(
                "ipfs_prefix",
                format!("`{ipfs_prefix}` is not an absolute http(s) URL"),
            ));
        }

        validate_class(
            "css_class_for_internal_links",
            self.css_class_for_internal_links.as_deref(),
        )?;
        validate_class(
            "css_class_for_external_links",
            self.css_class_for_external_links.as_deref(),
        )?;

        if self.spoiler.prefix.is_whitespace() || matches!(self.spoiler.prefix, '[' | '>') {
            return Err(ConfigError::invalid(
                "spoiler.prefix",
                format!("`{}` cannot open a spoiler", self.spoiler.prefix),
            ));
        }
        if self.spoiler.default_label.trim().is_empty() {
            return Err(ConfigError::invalid(
                "spoiler.default_label",
                "must not be empty",
            ));
        }
        if self.spoiler.max_label_length == 0 {
            return Err(ConfigError::invalid(
                "spoiler.max_label_length",
                "must be positive",
            ));
        }

        self.localization.validate()?;

        let is_link_safe_fn = self
            .is_link_safe_fn
            .unwrap_or_else(|| default_link_safety(base_url.clone()));
        let add_external_css_class_to_matching_links_fn = self
            .add_external_css_class_to_matching_links_fn
            .unwrap_or_else(|| negate(Arc::clone(&is_link_safe_fn)));

        Ok(RendererOptions {
            base_url,
            breaks: self.breaks,
            skip_sanitization: self.skip_sanitization,
            allow_insecure_script_tags: self.allow_insecure_script_tags,
            add_nofollow_to_links: self.add_nofollow_to_links,
            add_target_blank_to_links: self.add_target_blank_to_links,
            css_class_for_internal_links: self.css_class_for_internal_links,
            css_class_for_external_links: self.css_class_for_external_links,
            do_not_show_images: self.do_not_show_images,
            ipfs_prefix,
            assets: self.assets,
            spoiler: self.spoiler,
            localization: self.localization,
            plugins: self.plugins,
            image_proxy_fn: self.image_proxy_fn.unwrap_or_else(identity_url),
            usertag_url_fn: self.usertag_url_fn.unwrap_or_else(default_usertag_url),
            hashtag_url_fn: self.hashtag_url_fn.unwrap_or_else(default_hashtag_url),
            is_link_safe_fn,
            add_external_css_class_to_matching_links_fn,
        })
    }
}

fn identity_url() -> UrlFn {
    Arc::new(|url: &str| url.to_owned())
}

fn default_usertag_url() -> UrlFn {
    Arc::new(|account: &str| format!("/@{account}"))
}

fn default_hashtag_url() -> UrlFn {
    Arc::new(|tag: &str| format!("/trending/{tag}"))
}

fn negate(predicate: LinkPredicate) -> LinkPredicate {
    Arc::new(move |url: &str| !predicate(url))
}

/// Relative links and links under the base URL are internal.
fn default_link_safety(base_url: String) -> LinkPredicate {
    Arc::new(move |url: &str| {
        let url = url.trim();
        (url.starts_with('/') && !url.starts_with("//"))
            || url.starts_with('#')
            || url.starts_with('?')
            || url == base_url
            || url
                .strip_prefix(base_url.as_str())
                .is_some_and(|rest| rest.starts_with(['/', '?', '#']))
    })
}

fn validate_class(field: &'static str, class: Option<&str>) -> Result<(), ConfigError> {
    let Some(class) = class else {
        return Ok(());
    };

    let valid = !class.trim().is_empty()
        && class.split_whitespace().all(|token| {
            token
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("`{class}` is not a list of CSS class names"),
        ))
    }
}

/// Host of an absolute `http(s)://` URL, without port or credentials.
pub(crate) fn host_of(url: &str) -> Option<&str> {
    let scheme_len = if url.get(..8).is_some_and(|s| s.eq_ignore_ascii_case("https://")) {
        8
    } else if url.get(..7).is_some_and(|s| s.eq_ignore_ascii_case("http://")) {
        7
    } else {
        return None;
    };

    let rest = &url[scheme_len..];
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    (!host.is_empty()).then_some(host)
}
