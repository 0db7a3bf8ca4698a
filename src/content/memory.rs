// ABOUTME: In-memory content repository and query implementation
// ABOUTME: Backs entry/page lookups and collection queries for embedding and tests

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::conditions::{Condition, SortKey};
use super::{Conditions, ContentItem, ContentKind, ContentQuery, ContentRepository, Result};

#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    items: Vec<ContentItem>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: ContentItem) {
        self.items.retain(|existing| existing.id != item.id);
        self.items.push(item);
    }

    pub fn with_item(mut self, item: ContentItem) -> Self {
        self.insert(item);
        self
    }

    fn entries(&self) -> impl Iterator<Item = &ContentItem> {
        self.items
            .iter()
            .filter(|item| item.kind == ContentKind::Entry)
    }
}

impl ContentRepository for MemoryContentStore {
    fn find(&self, kind: ContentKind, id: &str) -> Option<ContentItem> {
        self.items
            .iter()
            .find(|item| kind.matches(item.kind) && item.id == id)
            .cloned()
    }

    fn find_by_uri(&self, kind: ContentKind, uri: &str) -> Option<ContentItem> {
        self.items
            .iter()
            .find(|item| kind.matches(item.kind) && item.uri.as_deref() == Some(uri))
            .cloned()
    }

    fn all_entries(&self) -> Box<dyn ContentQuery> {
        Box::new(MemoryQuery::new(self.entries().cloned().collect()))
    }

    fn where_collection(&self, names: &[String]) -> Box<dyn ContentQuery> {
        let items = self
            .entries()
            .filter(|item| {
                item.collection
                    .as_ref()
                    .is_some_and(|collection| names.contains(collection))
            })
            .cloned()
            .collect();
        Box::new(MemoryQuery::new(items))
    }
}

/// Working set of entries filtered in place.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    items: Vec<ContentItem>,
    locale: Option<String>,
    now: DateTime<Utc>,
}

impl MemoryQuery {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self::at(items, Utc::now())
    }

    /// Query whose notion of future and past is relative to `now`
    pub fn at(items: Vec<ContentItem>, now: DateTime<Utc>) -> Self {
        Self {
            items,
            locale: None,
            now,
        }
    }

    fn attributes(&self, item: &ContentItem) -> JsonValue {
        item.to_array(self.locale.as_deref())
    }
}

impl ContentQuery for MemoryQuery {
    fn localize(&mut self, locale: &str) {
        self.locale = Some(locale.to_string());
    }

    fn remove_unpublished(&mut self) {
        self.items.retain(|item| item.published);
    }

    fn remove_published(&mut self) {
        self.items.retain(|item| !item.published);
    }

    fn remove_future(&mut self) {
        let now = self.now;
        self.items
            .retain(|item| item.date.map_or(true, |date| date <= now));
    }

    fn remove_past(&mut self) {
        let now = self.now;
        self.items
            .retain(|item| item.date.map_or(true, |date| date >= now));
    }

    fn remove_before(&mut self, timestamp: DateTime<Utc>) {
        self.items
            .retain(|item| item.date.map_or(true, |date| date >= timestamp));
    }

    fn remove_after(&mut self, timestamp: DateTime<Utc>) {
        self.items
            .retain(|item| item.date.map_or(true, |date| date <= timestamp));
    }

    fn conditions(&mut self, filters: &Conditions) -> Result<()> {
        let conditions = filters
            .iter()
            .map(|(key, value)| Condition::parse(key, value))
            .collect::<Result<Vec<_>>>()?;

        debug!("Applying {} condition filters", conditions.len());

        let locale = self.locale.clone();
        self.items.retain(|item| {
            let attributes = item.to_array(locale.as_deref());
            conditions.iter().all(|condition| condition.matches(&attributes))
        });
        Ok(())
    }

    fn multisort(&mut self, sort: &str) -> Result<()> {
        let keys = SortKey::parse_list(sort)?;

        let locale = self.locale.clone();
        let mut keyed: Vec<(JsonValue, ContentItem)> = self
            .items
            .drain(..)
            .map(|item| (item.to_array(locale.as_deref()), item))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            keys.iter()
                .map(|key| key.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.items = keyed.into_iter().map(|(_, item)| item).collect();
        Ok(())
    }

    fn splice(&mut self, offset: usize, limit: usize) {
        self.items = self.items.drain(..).skip(offset).take(limit).collect();
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn to_array(&self) -> Vec<JsonValue> {
        self.items.iter().map(|item| self.attributes(item)).collect()
    }
}
