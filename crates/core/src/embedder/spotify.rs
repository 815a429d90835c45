use std::sync::LazyLock;

use regex::Regex;

use super::{EmbedMatcher, EmbedMetadata};
use crate::options::AssetSize;

static SPOTIFY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bhttps?://open\.spotify\.com/(playlist|show|episode|album|track|artist)/([A-Za-z0-9]{22})\b(?:\?[\w=&%;.-]*)?",
    )
    .unwrap()
});
static SPOTIFY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:embed|embed-podcast)/(?:playlist|show|episode|album|track|artist)/[A-Za-z0-9]{22}$")
        .unwrap()
});

/// `open.spotify.com/{playlist|show|episode|album|track|artist}/{id}`.
///
/// Shows use the `embed-podcast` player, everything else the regular one.
pub struct SpotifyMatcher;

impl EmbedMatcher for SpotifyMatcher {
    fn kind(&self) -> &'static str {
        "spotify"
    }

    fn embed_metadata(&self, text: &str) -> Option<EmbedMetadata> {
        let caps = SPOTIFY_URL.captures(text)?;
        let kind = caps.get(1)?.as_str().to_ascii_lowercase();
        let id = caps.get(2)?.as_str();
        let player = if kind == "show" { "embed-podcast" } else { "embed" };

        Some(EmbedMetadata {
            id: format!("{player}/{kind}/{id}"),
            url: caps.get(0)?.as_str().to_owned(),
            image: Some(format!("https://open.spotify.com/{kind}/{id}")),
            link: None,
        })
    }

    fn process_embed(&self, id: &str, size: AssetSize) -> Option<String> {
        SPOTIFY_ID.is_match(id).then(|| {
            format!(
                r#"<iframe src="https://open.spotify.com/{id}" width="{}" height="{}" frameborder="0" allowtransparency="true" allow="encrypted-media"></iframe>"#,
                size.width, size.height
            )
        })
    }
}
