//! Shared utilities for `scriptcheck`.
//!
//! - Time formatting for run directories and log lines
//! - File name sanitisation for per-test logs
//! - Text truncation for summary lines

pub mod time;

/// Turn a test name into a token that is safe to use as a file name.
///
/// Alphanumerics, space, `-` and `_` are kept and everything else is
/// dropped. Trailing whitespace is trimmed, then spaces become `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

/// First `max_chars` characters of `text` (never splits a UTF-8 sequence).
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// First line of `text`, or the whole text if it has no newline.
#[must_use]
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or(text)
}
