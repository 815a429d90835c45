use std::sync::LazyLock;

use regex::Regex;

use super::{EmbedMatcher, EmbedMetadata, video_iframe};
use crate::options::AssetSize;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bhttps?://(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[\w=%;.-]*&(?:amp;)?)?v=|embed/|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#][\w=&%;.-]*)?",
    )
    .unwrap()
});
static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// `youtube.com/watch?v=`, `/embed/`, `/shorts/`, `/live/` and `youtu.be/`.
pub struct YouTubeMatcher;

impl EmbedMatcher for YouTubeMatcher {
    fn kind(&self) -> &'static str {
        "youtube"
    }

    fn embed_metadata(&self, text: &str) -> Option<EmbedMetadata> {
        let caps = YOUTUBE_URL.captures(text)?;
        let id = caps.get(1)?.as_str().to_owned();

        Some(EmbedMetadata {
            url: caps.get(0)?.as_str().to_owned(),
            image: Some(format!("https://img.youtube.com/vi/{id}/0.jpg")),
            link: Some(format!("https://www.youtube.com/watch?v={id}")),
            id,
        })
    }

    fn process_embed(&self, id: &str, size: AssetSize) -> Option<String> {
        VIDEO_ID
            .is_match(id)
            .then(|| video_iframe(&format!("https://www.youtube.com/embed/{id}"), size))
    }
}
