//! Text Formatting
//!
//! Word (or character) truncation for draft excerpts.

use regex::Regex;
use std::sync::OnceLock;

use crate::settings::FormattingSettings;

/// Default number of units kept by [`FormattingSettings::trim_words`]
pub const DEFAULT_TRIM_LENGTH: usize = 55;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\n\r\t ]+").expect("static pattern"))
}

/// Collapse runs of spaces, tabs and newlines and strip the ends.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = whitespace_run().replace_all(text, " ");
    let trimmed = collapsed.strip_prefix(' ').unwrap_or(&collapsed);
    trimmed.strip_suffix(' ').unwrap_or(trimmed).to_string()
}

impl FormattingSettings {
    /// Trim `text` to `num_words` units (55 when `None`), appending `more`
    /// (or the configured marker) only when something was cut.
    pub fn trim_words(&self, text: &str, num_words: Option<usize>, more: Option<&str>) -> String {
        let num_words = num_words.unwrap_or(DEFAULT_TRIM_LENGTH);
        let more = more.unwrap_or(&self.trim_words_more);
        let text = normalize_whitespace(text);

        if self.trim_words_by_character {
            let count = text.chars().count();
            if count <= num_words {
                return text;
            }
            let mut trimmed: String = text.chars().take(num_words).collect();
            trimmed.push_str(more);
            return trimmed;
        }

        let words: Vec<&str> = text.split(' ').collect();
        if words.len() <= num_words {
            return text;
        }
        let mut trimmed = words[..num_words].join(" ");
        trimmed.push_str(more);
        trimmed
    }
}
