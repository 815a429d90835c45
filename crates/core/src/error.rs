//! Error types shared by the rendering pipeline.

use std::fmt;
use std::io;

/// Raised while building [`crate::RendererOptions`] or the sanitizer policy.
///
/// A renderer is never constructed from options that produced this error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required option was not supplied.
    #[error("missing required option `{0}`")]
    MissingField(&'static str),

    /// An option was supplied with an unusable value.
    #[error("invalid option `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The JSON configuration could not be parsed.
    #[error("invalid renderer configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Which family of unsafe markup tripped the security checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityViolation {
    ScriptTag,
    JavascriptUri,
    EventHandler,
}

impl fmt::Display for SecurityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecurityViolation::ScriptTag => "text contains script tag",
            SecurityViolation::JavascriptUri => "text contains javascript: uri",
            SecurityViolation::EventHandler => "text contains inline event handler",
        })
    }
}

/// Fatal content rejection. The whole render call has failed and no partial
/// output may be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("renderer rejected the input because of insecure content: {violation} (near `{snippet}`)")]
pub struct SecurityError {
    pub violation: SecurityViolation,
    /// The matched fragment, truncated for logging.
    pub snippet: String,
}

/// Anything that can go wrong inside a single render call.
///
/// Only [`RenderError::Security`] escapes [`crate::Renderer::render`]; the
/// other variants are turned into the plain-paragraph fallback.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Markdown writer or lol_html failure, surfaced through the rewriter's
    /// `io::Write` bridge.
    #[error("rendering failed: {0}")]
    Io(#[from] io::Error),

    #[error("rendered output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
