//! Token metadata access.
//!
//! Token metadata (TZIP-21 and the many dialects minting platforms invented
//! around it) has no reliable shape: any field may be missing, misspelled in
//! camelCase, a number where a string was expected, or an object where a list
//! was expected. [`TokenMetadata`] keeps the raw JSON object and exposes
//! tolerant accessors that never fail, they just return `None` or an empty list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-flexible metadata bag for a single token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenMetadata(Map<String, Value>);

/// A `{name, value}` attribute entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An entry of the `formats` or `media` lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaEntry {
    /// Location of the file (often `ipfs://`)
    pub uri: Option<String>,
    /// Declared MIME type
    pub mime_type: Option<String>,
    /// Raw duration value, if the minter recorded one
    pub duration: Option<Value>,
}

impl TokenMetadata {
    /// Wrap a JSON value. Only objects are metadata; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// True if the object has no keys at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Non-empty, trimmed string field
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// First non-empty string among several near-synonym keys
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// True if the field exists with a meaningful value
    /// (non-empty string, non-empty list, any number).
    pub fn has_value(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Number(_)) => true,
            Some(Value::Bool(b)) => *b,
            Some(Value::Object(map)) => !map.is_empty(),
            _ => false,
        }
    }

    /// `attributes` as name/value pairs.
    ///
    /// Accepts `name` or the OpenSea-style `trait_type` for the key, and
    /// stringifies numeric values. Entries without a name are skipped.
    pub fn attributes(&self) -> Vec<Attribute> {
        self.list("attributes")
            .filter_map(|entry| {
                let obj = entry.as_object()?;
                let name = ["name", "trait_type", "key"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(value_to_text))?;
                let value = obj.get("value").and_then(value_to_text).unwrap_or_default();
                Some(Attribute { name, value })
            })
            .collect()
    }

    /// Value of the first attribute whose name matches one of `names`
    /// (case-insensitive) and whose value is non-empty.
    pub fn attribute(&self, names: &[&str]) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|attr| !attr.value.is_empty() && name_matches(&attr.name, names))
            .map(|attr| attr.value)
    }

    /// True if any attribute carries one of `names`, regardless of value
    pub fn has_attribute(&self, names: &[&str]) -> bool {
        self.attributes()
            .iter()
            .any(|attr| name_matches(&attr.name, names))
    }

    /// The `formats` list
    pub fn formats(&self) -> Vec<MediaEntry> {
        self.media_list("formats")
    }

    /// The non-standard `media` list some platforms use
    pub fn media(&self) -> Vec<MediaEntry> {
        self.media_list("media")
    }

    /// Creator names/addresses, in declared order
    pub fn creators(&self) -> Vec<String> {
        self.string_list("creators")
    }

    /// Free-form tags, in declared order
    pub fn tags(&self) -> Vec<String> {
        self.string_list("tags")
    }

    fn list(&self, key: &str) -> impl Iterator<Item = &Value> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            // A bare string where a list was expected
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => self.list(key).filter_map(value_to_text).collect(),
        }
    }

    fn media_list(&self, key: &str) -> Vec<MediaEntry> {
        self.list(key)
            .filter_map(Value::as_object)
            .map(|obj| MediaEntry {
                uri: ["uri", "url"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(value_to_text)),
                mime_type: ["mimeType", "mime_type"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(value_to_text)),
                duration: obj.get("duration").filter(|v| !v.is_null()).cloned(),
            })
            .collect()
    }
}

impl From<Map<String, Value>> for TokenMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Render a scalar JSON value as trimmed text; `None` for empty/null/compound values.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn name_matches(name: &str, names: &[&str]) -> bool {
    names.iter().any(|n| name.trim().eq_ignore_ascii_case(n))
}
