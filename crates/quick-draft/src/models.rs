//! Draft Models
//!
//! Data structures exchanged with the draft endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::bridge::{Method, RequestOptions};
use crate::error::ValidationError;
use crate::settings::Settings;

/// The only status a quick draft may carry
pub const DRAFT_STATUS: &str = "draft";

/// A draft post. `id` stays `None` until the first successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "rendered_text")]
    pub title: String,
    #[serde(default, deserialize_with = "rendered_text")]
    pub content: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Any other attribute the server sent or the form supplied (e.g. `link`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_status() -> String {
    DRAFT_STATUS.to_string()
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            content: String::new(),
            status: default_status(),
            date: None,
            modified: None,
            extra: Map::new(),
        }
    }
}

/// Accepts `"text"` or a REST-style `{"raw": …, "rendered": …}` object.
fn rendered_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextField {
        Plain(String),
        Rendered {
            #[serde(default)]
            raw: Option<String>,
            #[serde(default)]
            rendered: Option<String>,
        },
    }

    Ok(match Option::<TextField>::deserialize(deserializer)? {
        Some(TextField::Plain(text)) => text,
        Some(TextField::Rendered { raw, rendered }) => rendered.or(raw).unwrap_or_default(),
        None => String::new(),
    })
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Merge serialized form fields into the draft; later duplicates win.
    pub fn assign(&mut self, values: &FormValues) {
        for (name, value) in values.iter() {
            match name {
                "title" => self.title = value.to_string(),
                "content" => self.content = value.to_string(),
                "status" => self.status = value.to_string(),
                other => {
                    self.extra.insert(other.to_string(), Value::String(value.to_string()));
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.status != DRAFT_STATUS {
            return Err(ValidationError::InvalidStatus(self.status.clone()));
        }
        Ok(())
    }

    /// Raw attributes as a JSON object (a copy; the draft is untouched)
    pub fn attributes(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Create (no id yet) or update request for this draft
    pub fn save_request(&self, settings: &Settings) -> RequestOptions {
        let url = match self.id {
            Some(id) => settings.rest_url(&format!("wp/v2/posts/{}", id)),
            None => settings.rest_url("wp/v2/posts"),
        };
        let mut data = self.attributes();
        data.remove("id");
        RequestOptions::new(Method::Post).url(url).data(data)
    }

    /// Adopt the server's copy after a save. A null payload keeps the local copy.
    pub fn apply_server_response(&mut self, payload: Value) -> Result<(), serde_json::Error> {
        if payload.is_null() {
            return Ok(());
        }
        *self = serde_json::from_value(payload)?;
        Ok(())
    }
}

/// One page of drafts as returned by the list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPage {
    pub items: Vec<Draft>,
    pub has_more: bool,
}

impl DraftPage {
    /// Accepts `{"items": [...], "hasMore": bool}` or a bare array.
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PagePayload {
            Paged {
                items: Vec<Draft>,
                #[serde(default, rename = "hasMore")]
                has_more: bool,
            },
            Bare(Vec<Draft>),
        }

        Ok(match serde_json::from_value(payload)? {
            PagePayload::Paged { items, has_more } => DraftPage { items, has_more },
            PagePayload::Bare(items) => DraftPage { items, has_more: false },
        })
    }
}

/// Serialized form fields, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues(Vec<(String, String)>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// True when at least one field is non-empty
    pub fn has_values(&self) -> bool {
        self.0.iter().any(|(_, value)| !value.is_empty())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_rest_shape() {
        let draft: Draft = serde_json::from_value(json!({
            "id": 12,
            "title": {"raw": "Raw", "rendered": "Rendered &amp; more"},
            "content": {"rendered": "<p>Body</p>"},
            "status": "draft",
            "date": "2017-06-01T10:20:30",
            "link": "https://example.org/?p=12"
        }))
        .unwrap();

        assert_eq!(draft.id, Some(12));
        assert_eq!(draft.title, "Rendered &amp; more");
        assert_eq!(draft.content, "<p>Body</p>");
        assert_eq!(draft.date.as_deref(), Some("2017-06-01T10:20:30"));
        assert_eq!(draft.extra.get("link"), Some(&json!("https://example.org/?p=12")));
    }

    #[test]
    fn test_deserialize_plain_and_missing_fields() {
        let draft: Draft = serde_json::from_value(json!({"title": "T", "content": null})).unwrap();
        assert_eq!(draft.title, "T");
        assert_eq!(draft.content, "");
        assert_eq!(draft.status, DRAFT_STATUS);
        assert!(draft.is_new());
    }

    #[test]
    fn test_assign_and_validate() {
        let mut draft = Draft::new();
        let values: FormValues = [("title", "Hello"), ("content", "World"), ("_wpnonce", "abc")].into_iter().collect();
        draft.assign(&values);
        assert_eq!(draft.title, "Hello");
        assert_eq!(draft.content, "World");
        assert_eq!(draft.extra.get("_wpnonce"), Some(&json!("abc")));
        assert!(draft.validate().is_ok());

        draft.assign(&[("status", "publish")].into_iter().collect());
        assert_eq!(draft.validate(), Err(ValidationError::InvalidStatus("publish".to_string())));
    }

    #[test]
    fn test_save_request_targets_create_then_update() {
        let settings = Settings::default();
        let mut draft = Draft { title: "T".into(), ..Draft::new() };

        let create = draft.save_request(&settings);
        assert_eq!(create.method, Method::Post);
        assert_eq!(create.url.as_deref(), Some("/wp-json/wp/v2/posts"));
        assert_eq!(create.data.get("title"), Some(&json!("T")));
        assert_eq!(create.data.get("status"), Some(&json!("draft")));
        assert!(!create.data.contains_key("id"));

        draft.id = Some(5);
        assert_eq!(draft.save_request(&settings).url.as_deref(), Some("/wp-json/wp/v2/posts/5"));
    }

    #[test]
    fn test_apply_server_response() {
        let mut draft = Draft { title: "Local".into(), ..Draft::new() };
        draft.apply_server_response(Value::Null).unwrap();
        assert_eq!(draft.title, "Local");

        draft.apply_server_response(json!({"id": 3, "title": "Saved", "status": "draft"})).unwrap();
        assert_eq!(draft.id, Some(3));
        assert_eq!(draft.title, "Saved");

        assert!(draft.apply_server_response(json!("garbage")).is_err());
    }

    #[test]
    fn test_page_payload_shapes() {
        let paged = DraftPage::from_payload(json!({"items": [{"id": 1}], "hasMore": true})).unwrap();
        assert_eq!(paged.items.len(), 1);
        assert!(paged.has_more);

        let bare = DraftPage::from_payload(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(bare.items.len(), 2);
        assert!(!bare.has_more);
    }

    #[test]
    fn test_form_values() {
        let values: FormValues = [("title", ""), ("content", "")].into_iter().collect();
        assert!(!values.has_values());
        let values: FormValues = [("title", ""), ("content", " ")].into_iter().collect();
        assert!(values.has_values());
        assert_eq!(values.get("content"), Some(" "));
    }
}
