use std::sync::LazyLock;

use regex::Regex;

use super::{EmbedMatcher, EmbedMetadata, video_iframe};
use crate::options::AssetSize;

static THREESPEAK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?3speak\.(?:tv|online|co)/(?:watch|embed)\?v=\s*([a-z0-9][a-z0-9.-]{1,15}/[a-z0-9-]+)",
    )
    .unwrap()
});
static THREESPEAK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9][a-z0-9.-]{1,15}/[a-z0-9-]+$").unwrap());

/// `3speak.{tv|online|co}/{watch|embed}?v={username}/{permlink}`.
pub struct ThreeSpeakMatcher;

impl EmbedMatcher for ThreeSpeakMatcher {
    fn kind(&self) -> &'static str {
        "threespeak"
    }

    fn embed_metadata(&self, text: &str) -> Option<EmbedMetadata> {
        let caps = THREESPEAK_URL.captures(text.trim())?;
        let id = caps.get(1)?.as_str().to_owned();

        Some(EmbedMetadata {
            url: caps.get(0)?.as_str().to_owned(),
            image: None,
            link: Some(format!("https://3speak.tv/watch?v={id}")),
            id,
        })
    }

    fn process_embed(&self, id: &str, size: AssetSize) -> Option<String> {
        THREESPEAK_ID
            .is_match(id)
            .then(|| video_iframe(&format!("https://3speak.tv/embed?v={id}"), size))
    }
}
