//! Cue Text Markup
//!
//! Cue text may carry a small inline-markup subset (`<b>`, `<i>`, `<u>`, plus
//! the paragraph/line-break tags a rich-text editor emits). Character and line
//! limits are always measured on the plain text left after stripping it.

use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>\s*<p[^>]*>").unwrap());

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static NAMED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?([A-Za-z][A-Za-z0-9]*)[^>]*>").unwrap());

/// Inline styles the editor renders
const STYLE_TAGS: [&str; 3] = ["b", "i", "u"];

/// Removes markup and decodes the handful of entities editors produce
pub fn strip_markup(text: &str) -> String {
    let with_breaks = LINE_BREAK_TAG.replace_all(text, "\n");
    let plain = ANY_TAG.replace_all(&with_breaks, "");
    decode_entities(&plain)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Drops every tag except the supported inline styles (voice and class spans
/// from WebVTT, font tags from SubRip)
pub fn retain_style_tags(text: &str) -> String {
    NAMED_TAG
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = caps[1].to_ascii_lowercase();
            if STYLE_TAGS.contains(&name.as_str()) {
                caps[0].to_ascii_lowercase()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Plain-text lines of a cue, as counted by line limits
pub fn text_lines(text: &str) -> Vec<String> {
    strip_markup(text)
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
