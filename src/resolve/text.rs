use std::sync::LazyLock;

use regex::Regex;

static BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>").expect("valid regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Turns description markup into plain text, keeping line structure.
pub fn strip_markup(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = BREAK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    decode_entities(&text)
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
