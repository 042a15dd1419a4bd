use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static BLANK_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s|&nbsp;|&#160;|\x{a0})*$").expect("blank-text pattern is valid")
});

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: keeps formatting tags (like <b>, <p>) and drops scripts,
/// iframes and event-handler attributes. Question bodies go through this
/// before they are handed to a learner.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Elements that show something without any text.
const MEDIA_TAGS: [&str; 6] = ["img", "video", "audio", "iframe", "embed", "object"];

/// Strips every tag except media elements, which lose their attributes.
fn strip_to_media(input: &str) -> String {
    let mut builder = ammonia::Builder::empty();
    builder
        .tags(HashSet::from(MEDIA_TAGS))
        .clean_content_tags(HashSet::from(["script", "style"]));
    builder.clean(input).to_string()
}

/// True when rich-text markup renders neither text nor media.
///
/// Covers the editor's empty-paragraph sentinel (`<p><br></p>`) and
/// non-breaking-space padding. An image on its own is content.
pub fn is_blank_markup(input: &str) -> bool {
    BLANK_TEXT.is_match(&strip_to_media(input))
}

/// Blank check for a question body in either editor mode.
pub fn is_blank_body(body: &str, is_plain_text: bool) -> bool {
    if is_plain_text {
        body.trim().is_empty()
    } else {
        is_blank_markup(body)
    }
}
