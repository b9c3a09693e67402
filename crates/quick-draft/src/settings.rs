//! Widget Settings
//!
//! Localization and formatting values supplied once at startup and handed to
//! every component that needs them.

use serde::Deserialize;

/// Top-level settings object (matches the `quickDraftSettings` page global)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub formatting: FormattingSettings,
    pub ajax: AjaxSettings,
    /// REST root the draft endpoints hang off
    pub api_root: String,
    pub current_user_id: u64,
    /// Offset appended to raw draft timestamps, e.g. `+02:00`
    pub timezone_offset: String,
    /// Number of drafts requested and shown
    pub per_page: usize,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            formatting: FormattingSettings::default(),
            ajax: AjaxSettings::default(),
            api_root: "/wp-json".to_string(),
            current_user_id: 0,
            timezone_offset: "+00:00".to_string(),
            per_page: 4,
            messages: Messages::default(),
        }
    }
}

impl Settings {
    /// Absolute path of a REST route under the configured root
    pub fn rest_url(&self, route: &str) -> String {
        format!("{}/{}", self.api_root.trim_end_matches('/'), route.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingSettings {
    /// Appended to trimmed text when no marker is passed explicitly
    pub trim_words_more: String,
    /// Count characters instead of words (for languages written without spaces)
    pub trim_words_by_character: bool,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            trim_words_more: "\u{2026}".to_string(),
            trim_words_by_character: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AjaxSettings {
    pub url: String,
}

impl Default for AjaxSettings {
    fn default() -> Self {
        Self {
            url: "/wp-admin/admin-ajax.php".to_string(),
        }
    }
}

/// Localized strings, looked up by key and never interpolated
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Messages {
    pub error_empty_fields: String,
    pub error: String,
    pub no_title: String,
    pub new_draft_created: String,
    pub invalid_status: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            error_empty_fields: "Please fill in at least one field.".to_string(),
            error: "An error has occurred. Please reload the page and try again.".to_string(),
            no_title: "(no title)".to_string(),
            new_draft_created: "New draft created.".to_string(),
            invalid_status: "Quick drafts can only be saved as drafts.".to_string(),
        }
    }
}
