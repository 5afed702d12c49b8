//! The raw metadata document of one collection, as served by the archive

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub files: Vec<RawFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFile {
    pub name: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// for derivative files, the file they were derived from
    #[serde(default)]
    pub original: Option<String>,
}

impl RawRecord {
    /// Reads a metadata field as one string.
    ///
    /// Lists are joined with a single space, blank values count as absent.
    pub fn field(&self, key: &str) -> Option<String> {
        let value = match self.metadata.get(key)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::String(_) | Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(" "),
            other => other.to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    /// first key among `keys` that has a value
    pub fn first_field(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.field(key))
    }

    /// Reads a field that may be a list, keeping items separate
    pub fn field_list(&self, key: &str) -> Vec<String> {
        match self.metadata.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => vec![s.trim().to_string()],
            _ => vec![],
        }
    }
}

impl RawFile {
    pub fn is_original(&self) -> bool {
        self.source.as_deref() == Some("original")
    }
}
