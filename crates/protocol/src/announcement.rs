use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names tried, in order, when picking the text shown in the ticker.
const HEADLINE_KEYS: [&str; 4] = ["title", "heading", "name", "text"];

/// Field names tried, in order, when picking a link target.
const LINK_KEYS: [&str; 3] = ["link", "url", "href"];

/// One announcement as served by the conference module.
///
/// Only `sequence` is interpreted. Every other field is kept as-is so that
/// renderers can read whatever the service sends without this type having
/// to track its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementItem {
    /// Ordering key, ascending.
    pub sequence: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AnnouncementItem {
    pub fn new(sequence: f64) -> Self {
        Self {
            sequence,
            fields: Map::new(),
        }
    }

    /// Builder-style helper used by hosts and tests to attach a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Text to display for this announcement, if the record carries any.
    pub fn headline(&self) -> Option<&str> {
        self.first_str(&HEADLINE_KEYS)
    }

    pub fn link(&self) -> Option<&str> {
        self.first_str(&LINK_KEYS)
    }

    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}
