// ABOUTME: Asset model and asset repository abstraction
// ABOUTME: Provides lookup of assets by id (container::path) or by URL/path for template functions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// A file managed by the host, addressed as `container::path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,

    #[serde(default)]
    pub container: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub url: String,

    #[serde(flatten)]
    pub data: Map<String, JsonValue>,
}

impl Asset {
    /// Build an asset from its container handle, path inside the container and public URL
    pub fn new(container: &str, path: &str, url: &str) -> Self {
        Self {
            id: format!("{}::{}", container, path),
            container: container.to_string(),
            path: path.to_string(),
            url: url.to_string(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Try to interpret a template value as an already resolved asset
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let obj = value.as_object()?;
        if !obj.get("id").is_some_and(JsonValue::is_string) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Serialize the asset's attributes for templates
    pub fn to_array(&self) -> JsonValue {
        let mut attributes = self.data.clone();
        attributes.insert("id".to_string(), JsonValue::String(self.id.clone()));
        attributes.insert(
            "container".to_string(),
            JsonValue::String(self.container.clone()),
        );
        attributes.insert("path".to_string(), JsonValue::String(self.path.clone()));
        attributes.insert("url".to_string(), JsonValue::String(self.url.clone()));
        if let Some(extension) = std::path::Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
        {
            attributes.insert(
                "extension".to_string(),
                JsonValue::String(extension.to_lowercase()),
            );
        }
        JsonValue::Object(attributes)
    }
}

pub trait AssetRepository: Send + Sync {
    /// Find an asset by id (`container::path`) or by its URL
    fn find(&self, id: &str) -> Option<Asset>;
}

/// Asset repository kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<String, Asset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, asset: Asset) {
        let mut assets = self.assets.write().unwrap_or_else(PoisonError::into_inner);
        assets.insert(asset.id.clone(), asset);
    }

    pub fn with_asset(self, asset: Asset) -> Self {
        self.insert(asset);
        self
    }
}

impl AssetRepository for MemoryAssetStore {
    fn find(&self, id: &str) -> Option<Asset> {
        let assets = self.assets.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(asset) = assets.get(id) {
            return Some(asset.clone());
        }

        // Fall back to URL lookup
        assets.values().find(|asset| asset.url == id).cloned()
    }
}
