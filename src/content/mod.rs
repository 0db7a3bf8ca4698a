// ABOUTME: Content model and the repository/query capabilities used by template functions
// ABOUTME: Defines entries and pages, lookup by id or URI, and the chainable collection query

pub mod conditions;
pub mod memory;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use thiserror::Error;

pub use conditions::{Condition, Operator, SortKey};
pub use memory::MemoryContentStore;

#[derive(Error, Debug, PartialEq)]
pub enum ContentError {
    #[error("Malformed condition '{0}': expected key=value")]
    MalformedCondition(String),

    #[error("Unknown condition operator '{operator}' for field '{field}'")]
    UnknownOperator { field: String, operator: String },

    #[error("Invalid sort specification: {0}")]
    InvalidSort(String),
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Condition filters keyed by `field[:operator]`; insertion ordered, last write wins.
pub type Conditions = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Entry,
    Page,
    /// Matches any kind of content
    Any,
}

impl ContentKind {
    pub fn matches(self, other: ContentKind) -> bool {
        self == ContentKind::Any || other == ContentKind::Any || self == other
    }
}

/// A piece of content: an entry in a collection or a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,

    #[serde(default)]
    pub collection: Option<String>,

    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default = "default_published")]
    pub published: bool,

    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data: Map<String, JsonValue>,

    /// Per-locale data overrides
    #[serde(default)]
    pub localizations: HashMap<String, Map<String, JsonValue>>,
}

fn default_published() -> bool {
    true
}

impl ContentItem {
    pub fn entry(id: &str, collection: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: ContentKind::Entry,
            collection: Some(collection.to_string()),
            uri: None,
            published: true,
            date: None,
            data: Map::new(),
            localizations: HashMap::new(),
        }
    }

    pub fn page(id: &str, uri: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: ContentKind::Page,
            collection: None,
            uri: Some(uri.to_string()),
            published: true,
            date: None,
            data: Map::new(),
            localizations: HashMap::new(),
        }
    }

    pub fn with_uri(mut self, uri: &str) -> Self {
        self.uri = Some(uri.to_string());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_localization(mut self, locale: &str, key: &str, value: impl Into<JsonValue>) -> Self {
        self.localizations
            .entry(locale.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    /// Serialize attributes for templates, applying the locale's overrides
    pub fn to_array(&self, locale: Option<&str>) -> JsonValue {
        let mut attributes = self.data.clone();

        if let Some(overrides) = locale.and_then(|l| self.localizations.get(l)) {
            for (key, value) in overrides {
                attributes.insert(key.clone(), value.clone());
            }
        }

        attributes.insert("id".to_string(), JsonValue::String(self.id.clone()));
        attributes.insert(
            "kind".to_string(),
            serde_json::to_value(self.kind).unwrap_or(JsonValue::Null),
        );
        if let Some(ref collection) = self.collection {
            attributes.insert(
                "collection".to_string(),
                JsonValue::String(collection.clone()),
            );
        }
        if let Some(ref uri) = self.uri {
            attributes.insert("uri".to_string(), JsonValue::String(uri.clone()));
            attributes.insert("url".to_string(), JsonValue::String(uri.clone()));
        }
        attributes.insert("published".to_string(), JsonValue::Bool(self.published));
        if let Some(date) = self.date {
            attributes.insert("date".to_string(), JsonValue::String(date.to_rfc3339()));
            attributes.insert("timestamp".to_string(), JsonValue::from(date.timestamp()));
        }
        if let Some(locale) = locale {
            attributes.insert("locale".to_string(), JsonValue::String(locale.to_string()));
        }

        JsonValue::Object(attributes)
    }
}

/// Lookup side of the host content repository.
pub trait ContentRepository: Send + Sync {
    fn find(&self, kind: ContentKind, id: &str) -> Option<ContentItem>;

    fn find_by_uri(&self, kind: ContentKind, uri: &str) -> Option<ContentItem>;

    /// Query over every entry in every collection
    fn all_entries(&self) -> Box<dyn ContentQuery>;

    /// Query over the entries of the named collections
    fn where_collection(&self, names: &[String]) -> Box<dyn ContentQuery>;
}

/// Chainable filtering over a working set of entries.
pub trait ContentQuery {
    fn localize(&mut self, locale: &str);

    fn remove_unpublished(&mut self);

    fn remove_published(&mut self);

    fn remove_future(&mut self);

    fn remove_past(&mut self);

    /// Remove dated entries earlier than `timestamp`
    fn remove_before(&mut self, timestamp: DateTime<Utc>);

    /// Remove dated entries later than `timestamp`
    fn remove_after(&mut self, timestamp: DateTime<Utc>);

    /// Keep entries matching every condition
    fn conditions(&mut self, filters: &Conditions) -> Result<()>;

    /// Sort by `field[:asc|desc]` keys joined with `|`
    fn multisort(&mut self, sort: &str) -> Result<()>;

    fn splice(&mut self, offset: usize, limit: usize);

    fn count(&self) -> usize;

    fn to_array(&self) -> Vec<JsonValue>;
}

/// Parse `key:op=value&&key2=value2` into condition filters
pub fn parse_conditions(conditions: &str) -> Result<Conditions> {
    let mut filters = Conditions::new();

    for segment in conditions.split("&&") {
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| ContentError::MalformedCondition(segment.to_string()))?;
        filters.insert(key.to_string(), value.to_string());
    }

    Ok(filters)
}
