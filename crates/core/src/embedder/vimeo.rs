use std::sync::LazyLock;

use regex::Regex;

use super::{EmbedMatcher, EmbedMetadata, video_iframe};
use crate::options::AssetSize;

static VIMEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bhttps?://(?:www\.)?(?:player\.vimeo\.com/video/|vimeo\.com/(?:channels/[\w-]+/|groups/[\w-]+/videos/)?)(\d+)\b",
    )
    .unwrap()
});

pub struct VimeoMatcher;

impl EmbedMatcher for VimeoMatcher {
    fn kind(&self) -> &'static str {
        "vimeo"
    }

    fn embed_metadata(&self, text: &str) -> Option<EmbedMetadata> {
        let caps = VIMEO_URL.captures(text)?;
        let id = caps.get(1)?.as_str().to_owned();

        Some(EmbedMetadata {
            url: caps.get(0)?.as_str().to_owned(),
            image: None,
            link: Some(format!("https://vimeo.com/{id}")),
            id,
        })
    }

    fn process_embed(&self, id: &str, size: AssetSize) -> Option<String> {
        (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .then(|| video_iframe(&format!("https://player.vimeo.com/video/{id}"), size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_video_pages() {
        for url in [
            "https://vimeo.com/76979871",
            "https://vimeo.com/channels/staffpicks/76979871",
            "https://player.vimeo.com/video/76979871",
        ] {
            let metadata = VimeoMatcher.embed_metadata(url).unwrap();
            assert_eq!(metadata.id, "76979871");
            assert_eq!(metadata.url, url);
        }
    }

    #[test]
    fn ignores_non_video_pages() {
        assert!(VimeoMatcher.embed_metadata("https://vimeo.com/about").is_none());
    }
}
