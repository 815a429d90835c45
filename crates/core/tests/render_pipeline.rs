use std::sync::LazyLock;

use hivemark_core::{
    AssetEmbedder, RenderReport, Renderer, RendererOptions, SanitizationIssue, check_security,
    is_html,
};
use pretty_assertions::assert_eq;
use regex::Regex;

static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img\b[^>]*?\bsrc="([^"]*)""#).unwrap());
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<a\b[^>]*>"#).unwrap());
static ABSOLUTE_SRC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(https?:)?//").unwrap());

fn renderer() -> Renderer {
    Renderer::new(RendererOptions::builder("https://hive.blog").build().unwrap()).unwrap()
}

fn render(input: &str) -> String {
    renderer().render(input, None).unwrap()
}

fn report(input: &str) -> RenderReport {
    renderer().render_report(input, None).unwrap()
}

#[test]
fn output_never_carries_executable_payloads() {
    let payloads = [
        "<script>alert(1)</script>",
        "<SCRIPT SRC=//evil.example.com/x.js></SCRIPT>",
        "<img src=x onerror=alert(1)>",
        "<img src=\"https://x.io/a.png\" onload=\"alert(1)\">",
        "[click](javascript:alert(1))",
        "<a href=\"javascript:alert(1)\">x</a>",
        "<a href=\"jav&#x61;script&colon;alert(1)\">x</a>",
        "<a href=\" JaVaScRiPt:alert(1)\">x</a>",
        "<iframe src=\"javascript:alert(1)\"></iframe>",
        "<p>x</p><svg onload=alert(1)><circle /></svg>",
        "<div onmouseover=\"alert(1)\">hover</div>",
        "<details open ontoggle=alert(1)><summary>x</summary></details>",
        "<style>body{}</style><noscript><p title=\"</noscript><img src=x onerror=alert(1)>\"></noscript>",
    ];

    for payload in payloads {
        for input in [payload.to_owned(), format!("<html>{payload}</html>"), format!("text\n\n{payload}")] {
            let html = render(&input);
            let lowered = html.to_ascii_lowercase();

            assert!(check_security(&html, false).is_ok(), "{input} -> {html}");
            assert!(!lowered.contains("<script"), "{input} -> {html}");
            assert!(!lowered.contains("onerror="), "{input} -> {html}");
            assert!(!lowered.contains("href=\"javascript"), "{input} -> {html}");
            assert!(!lowered.contains("<iframe"), "{input} -> {html}");
        }
    }
}

#[test]
fn rendered_images_have_safe_sources() {
    let html = render(concat!(
        "![a](http://x.io/a.png) ![b](data:image/png;base64,AA) ![c](//cdn.example.com/c.jpg)\n\n",
        "<img src=\"javascript:alert(1)\"> <img src=\"/relative.png\">\n\n",
        "bare https://x.io/bare.gif image",
    ));

    let sources: Vec<&str> = IMG_SRC
        .captures_iter(&html)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .collect();

    assert_eq!(sources.len(), 6, "{html}");
    for src in sources {
        assert!(
            ABSOLUTE_SRC.is_match(src) || src == "brokenimg.jpg",
            "unsafe img src {src} in {html}"
        );
    }
}

#[test]
fn links_are_decorated_exactly_one_way() {
    let html = render(concat!(
        "[in](/trending/hive) [base](https://hive.blog/@alice/post) [out](https://example.com)\n\n",
        "#tag and @alice and https://bare.example.com/page",
    ));

    let anchors: Vec<&str> = ANCHOR
        .find_iter(&html)
        .map(|m| m.as_str())
        .filter(|tag| tag.contains("href="))
        .collect();
    assert_eq!(anchors.len(), 6, "{html}");

    for anchor in anchors {
        let internal = anchor.contains(r#"class="link-internal""#);
        let external = anchor.contains(r#"class="link-external""#)
            && anchor.contains(r#"rel="nofollow noopener""#)
            && anchor.contains(r#"target="_blank""#);
        assert!(internal ^ external, "{anchor}");
        if internal {
            assert!(!anchor.contains("rel="), "{anchor}");
        }
    }
}

#[test]
fn spoilers_render_as_details() {
    let html = render("> ! hidden text");
    assert!(html.contains("<details><summary>Reveal spoiler</summary>"), "{html}");
    assert!(html.contains("hidden text"));
    assert!(!html.contains("! hidden"));

    let html = render("> ![Custom] hidden");
    assert!(html.contains("<details><summary>Custom</summary>"), "{html}");
    assert!(html.contains("hidden"));
    assert!(!html.contains("[Custom]"));
}

#[test]
fn spotify_urls_map_to_embed_ids() {
    let embedder = AssetEmbedder::with_default_matchers("hive.blog");

    let (kind, track) = embedder
        .find_embed("listen https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh today")
        .unwrap();
    assert_eq!(kind, "spotify");
    assert_eq!(track.id, "embed/track/4iV5W9uYEdYUVa79Axb7Rh");
    assert_eq!(
        track.image.as_deref(),
        Some("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh")
    );

    let (_, show) = embedder
        .find_embed("https://open.spotify.com/show/2MAi0BvDc6GTFvKFPXnkCL")
        .unwrap();
    assert!(show.id.starts_with("embed-podcast/show/"), "{}", show.id);
}

#[test]
fn spotify_urls_render_as_players() {
    let html = render("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh");
    assert!(html.contains(r#"<iframe src="https://open.spotify.com/embed/track/4iV5W9uYEdYUVa79Axb7Rh""#));
}

#[test]
fn empty_input_renders_empty() {
    assert_eq!(render(""), "");
    assert_eq!(renderer().render_post_body("").unwrap(), "");
    assert_eq!(renderer().render_comment_body("").unwrap(), "");
}

#[test]
fn unsafe_iframes_become_placeholders() {
    let report = report(r#"<iframe src="https://evil.example.com/x"></iframe>"#);

    assert!(
        report
            .html
            .contains("<div>(Unsupported https://evil.example.com/x)</div>"),
        "{}",
        report.html
    );
    assert_eq!(
        report.sanitization_issues,
        vec![SanitizationIssue::UnsupportedIframe {
            src: "https://evil.example.com/x".to_owned()
        }]
    );
}

#[test]
fn rerendering_keeps_embeds_and_entities() {
    let renderer = renderer();
    let once = renderer
        .render("Tom & Jerry https://youtu.be/dQw4w9WgXcQ", None)
        .unwrap();
    let twice = renderer.render(&once, None).unwrap();

    assert!(is_html(&once));
    assert!(is_html(&twice));
    assert!(twice.contains("Tom &amp; Jerry"), "{twice}");
    assert!(!twice.contains("&amp;amp;"));
    assert_eq!(once, twice);
}

#[test]
fn html_comments_are_shown_not_executed() {
    let html = render("<p>a<!-- <script>alert(1)</script> -->b</p>");
    assert!(!html.to_ascii_lowercase().contains("<script"), "{html}");
}

#[test]
fn markers_in_attributes_stay_inside_the_attribute() {
    for payload in [
        "<iframe srcdoc=&lt;script&gt;alert(1)&lt;/script&gt;></iframe>",
        "<iframe src=https://evil.example.com/x></iframe>",
    ] {
        let input = format!(
            r#"<p><a href="https://hive.blog/x" title="~~~ embed:dQw4w9WgXcQ youtube ~~~ {payload}">x</a></p>"#
        );
        let html = render(&input);

        assert!(!html.contains("videoWrapper"), "{html}");
        assert!(
            html.contains(&format!(
                r#"title="~~~ embed&#58;dQw4w9WgXcQ youtube ~~~ {payload}""#
            )),
            "{html}"
        );
        assert!(html.ends_with(r#"class="link-internal">x</a></p></html>"#), "{html}");
    }
}

#[test]
fn markers_in_code_stay_text() {
    let html = render("`~~~ embed:dQw4w9WgXcQ youtube ~~~`");

    assert!(
        html.contains("<code>~~~ embed:dQw4w9WgXcQ youtube ~~~</code>"),
        "{html}"
    );
    assert!(!html.contains("<iframe"), "{html}");
}

#[test]
fn javascript_in_query_strings_is_not_rejected() {
    let html = render("[s](https://google.com/search?q=javascript:void)");

    assert!(
        html.contains(r#"href="https://google.com/search?q=javascript:void""#),
        "{html}"
    );
}
