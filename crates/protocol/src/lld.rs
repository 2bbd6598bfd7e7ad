//! Low-level discovery (LLD) document.
//!
//! The monitoring system consumes discovery results as
//!
//! ```text
//! {"data":[{"{#PORT}":"4028","{#DEVID}":"0",...}, ...]}
//! ```
//!
//! Keys are macro names: upper-case, `[A-Z0-9_]` only, wrapped in `{#...}`.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Errors for LLD encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum LldError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key is not a discovery macro: {0:?}")]
    InvalidMacro(String),
}

/// Formats a name as a discovery macro name (without the `{#` `}` wrapper).
///
/// Upper-cases, turns spaces into underscores, then drops every character
/// outside `[A-Z0-9_]`.
pub fn macro_name(name: &str) -> String {
    name.to_uppercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// One discovered instance: macro name -> value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryItem {
    fields: BTreeMap<String, String>,
}

impl DiscoveryItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field. The key is normalized with [`macro_name`].
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.fields.insert(macro_name(key), value.into());
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&macro_name(key)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DiscoveryItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(&format!("{{#{name}}}"), value)?;
        }
        map.end()
    }
}

/// Ordered list of discovered instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryData {
    items: Vec<DiscoveryItem>,
}

#[derive(Serialize)]
struct Document<'a> {
    data: &'a [DiscoveryItem],
}

#[derive(Deserialize)]
struct RawDocument {
    data: Vec<BTreeMap<String, String>>,
}

impl DiscoveryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiscoveryItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[DiscoveryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Encodes the document for the monitoring system.
    pub fn to_json(&self) -> Result<String, LldError> {
        Ok(serde_json::to_string(&Document { data: &self.items })?)
    }

    /// Parses a document produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, LldError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        let mut items = Vec::with_capacity(raw.data.len());

        for entry in raw.data {
            let mut fields = BTreeMap::new();
            for (key, value) in entry {
                let name = key
                    .strip_prefix("{#")
                    .and_then(|k| k.strip_suffix('}'))
                    .filter(|k| !k.is_empty() && *k == macro_name(k))
                    .ok_or_else(|| LldError::InvalidMacro(key.clone()))?;
                fields.insert(name.to_string(), value);
            }
            items.push(DiscoveryItem { fields });
        }

        Ok(Self { items })
    }
}

impl FromIterator<DiscoveryItem> for DiscoveryData {
    fn from_iter<I: IntoIterator<Item = DiscoveryItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DiscoveryData {
    type Item = DiscoveryItem;
    type IntoIter = std::vec::IntoIter<DiscoveryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
