use crate::PluginError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field names owned by the engine
pub const RESERVED_FIELDS: &[&str] = &["url", "from", "pending", "statusCode", "error"];

/// Returns true for bookkeeping fields that are stripped once a resource is final
pub fn is_internal_field(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('$')
}

/// One fetched or pending-to-fetch URL and its accumulated metadata
///
/// The core fields are typed; anything a plugin contributes lives in an open
/// map that is flattened next to them when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Canonical absolute URL, also the key in the resource table
    pub url: String,

    /// Every referrer that led here, in discovery order; `None` for the seed
    pub from: Vec<Option<String>>,

    /// True only while a fetch for this URL is outstanding
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,

    /// HTTP status code, recorded by the status plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Transport or parse failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Plugin-contributed fields
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Resource {
    /// Creates a resource whose fetch is about to be issued
    pub fn pending(url: impl Into<String>, from: Option<String>) -> Self {
        Self {
            url: url.into(),
            from: vec![from],
            pending: true,
            status_code: None,
            error: None,
            fields: Map::new(),
        }
    }

    /// Reads a plugin-contributed field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Writes a plugin-contributed field, returning the previous value
    ///
    /// Core field names are refused so that the serialized form never carries
    /// two values for the same key.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, PluginError> {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(PluginError::ReservedField(name));
        }
        Ok(self.fields.insert(name, value.into()))
    }

    /// All plugin-contributed fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Drops every internal (`_` or `$` prefixed) field
    pub fn strip_internal(&mut self) {
        self.fields.retain(|name, _| !is_internal_field(name));
    }
}

/// The deduplication ledger: canonical URL to resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTable {
    resources: BTreeMap<String, Resource>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.resources.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&Resource> {
        self.resources.get(url)
    }

    pub fn get_mut(&mut self, url: &str) -> Option<&mut Resource> {
        self.resources.get_mut(url)
    }

    /// Inserts a resource under its own URL
    pub fn insert(&mut self, resource: Resource) -> Option<Resource> {
        self.resources.insert(resource.url.clone(), resource)
    }

    pub fn remove(&mut self, url: &str) -> Option<Resource> {
        self.resources.remove(url)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// URLs in key order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(url, r)| (url.as_str(), r))
    }

    /// URLs of resources whose fetch is still outstanding
    pub fn pending_urls(&self) -> Vec<String> {
        self.resources
            .values()
            .filter(|r| r.pending)
            .map(|r| r.url.clone())
            .collect()
    }

    /// Number of resources whose fetch is still outstanding
    pub fn pending_count(&self) -> usize {
        self.resources.values().filter(|r| r.pending).count()
    }
}
