use std::sync::LazyLock;

use regex::Regex;

use super::{EmbedMatcher, EmbedMetadata, video_iframe};
use crate::options::AssetSize;

static TWITCH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhttps?://(?:www\.|m\.)?twitch\.tv/(?:videos/(\d+)|([a-z0-9_]{3,25}))\b")
        .unwrap()
});
static TWITCH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:videos/\d+|[a-z0-9_]{3,25})$").unwrap());

/// Site sections that look like channel names.
const RESERVED_PATHS: &[&str] = &["directory", "downloads", "jobs", "p", "settings", "turbo"];

/// Channels (`twitch.tv/{name}`) and past broadcasts (`twitch.tv/videos/{n}`).
///
/// Twitch refuses to play unless the embedding domain is passed as `parent`.
pub struct TwitchMatcher {
    parent: String,
}

impl TwitchMatcher {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
        }
    }
}

impl EmbedMatcher for TwitchMatcher {
    fn kind(&self) -> &'static str {
        "twitch"
    }

    fn embed_metadata(&self, text: &str) -> Option<EmbedMetadata> {
        let caps = TWITCH_URL.captures(text)?;
        let url = caps.get(0)?.as_str().to_owned();

        let id = if let Some(video) = caps.get(1) {
            format!("videos/{}", video.as_str())
        } else {
            let channel = caps.get(2)?.as_str().to_ascii_lowercase();
            if RESERVED_PATHS.contains(&channel.as_str()) {
                return None;
            }
            channel
        };

        Some(EmbedMetadata {
            link: Some(format!("https://www.twitch.tv/{id}")),
            image: None,
            url,
            id,
        })
    }

    fn process_embed(&self, id: &str, size: AssetSize) -> Option<String> {
        if !TWITCH_ID.is_match(id) {
            return None;
        }

        let query = match id.strip_prefix("videos/") {
            Some(video) => format!("video={video}"),
            None => format!("channel={id}"),
        };
        let src = format!(
            "https://player.twitch.tv/?{query}&amp;parent={}",
            self.parent
        );
        Some(video_iframe(&src, size))
    }
}
