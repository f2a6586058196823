use regex::Regex;
use std::sync::LazyLock;

static UNKNOWN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<unk>").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Removes backend `<unk>` markers and collapses every whitespace run,
/// newlines included, to one space. Word content is left untouched.
pub fn clean_transcript_text(raw: &str) -> String {
    let without_markers = UNKNOWN_TOKEN.replace_all(raw, " ");
    WHITESPACE_RUN
        .replace_all(&without_markers, " ")
        .trim()
        .to_string()
}
