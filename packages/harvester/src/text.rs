//! Text normalization shared by all parsers.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Runs of horizontal whitespace, including non-breaking spaces.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{2009}\u{202F}]+").expect("valid regex"));

/// Whitespace before closing punctuation, left behind by inline markup.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ([,.;:)])").expect("valid regex"));

/// Three or more newlines.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalize text to a single line: NFC, collapsed whitespace, trimmed.
///
/// # Examples
/// ```
/// use statute_harvester::text::normalize_inline;
///
/// assert_eq!(normalize_inline("  Tax\n  imposed\u{a0}.  "), "Tax imposed.");
/// ```
pub fn normalize_inline(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    let joined = nfc.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = INLINE_WHITESPACE.replace_all(&joined, " ");
    SPACE_BEFORE_PUNCT
        .replace_all(&collapsed, "$1")
        .trim()
        .to_string()
}

/// Normalize multi-paragraph text, keeping paragraph breaks.
///
/// Each line is normalized on its own, empty lines collapse to a single
/// blank line, and leading/trailing blank lines are dropped.
pub fn normalize_block(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    let lines: Vec<String> = nfc
        .lines()
        .map(|line| {
            let collapsed = INLINE_WHITESPACE.replace_all(line, " ");
            collapsed.trim().to_string()
        })
        .collect();
    let joined = lines.join("\n");
    EXTRA_NEWLINES
        .replace_all(&joined, "\n\n")
        .trim_matches('\n')
        .to_string()
}

/// Return `None` for blank text, otherwise the normalized text.
pub fn non_empty(text: &str) -> Option<String> {
    let normalized = normalize_inline(text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
