// ABOUTME: Render-time data passed to templates
// ABOUTME: Provides the scoped view data store and the HTTP request exposed as the `request` global

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use url::Url;

/// Scope that unscoped inserts land in.
pub const DEFAULT_SCOPE: &str = "cascade";

/// View data grouped in scopes; later scopes override earlier ones when flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    scopes: IndexMap<String, Map<String, JsonValue>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `value`'s fields in the default scope
    pub fn from_json(value: JsonValue) -> Self {
        let mut store = Self::new();
        if let JsonValue::Object(map) = value {
            store.merge(DEFAULT_SCOPE, map);
        }
        store
    }

    pub fn insert(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.scopes
            .entry(DEFAULT_SCOPE.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Merge data into a named scope
    pub fn merge(&mut self, scope: &str, data: Map<String, JsonValue>) {
        let target = self.scopes.entry(scope.to_string()).or_default();
        for (key, value) in data {
            target.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.scopes.values().rev().find_map(|scope| scope.get(key))
    }

    /// Flatten every scope into a single object
    pub fn get_all(&self) -> JsonValue {
        let mut all = Map::new();
        for scope in self.scopes.values() {
            for (key, value) in scope {
                all.insert(key.clone(), value.clone());
            }
        }
        JsonValue::Object(all)
    }
}

/// The request currently being served.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub root: String,
    pub path: String,
    pub secure: bool,
    pub query: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
}

impl Request {
    pub fn new(method: &str, url: &str) -> Self {
        let mut request = Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            ..Self::default()
        };

        match Url::parse(url) {
            Ok(parsed) => {
                request.secure = parsed.scheme() == "https";
                request.root = match parsed.port() {
                    Some(port) => format!(
                        "{}://{}:{}",
                        parsed.scheme(),
                        parsed.host_str().unwrap_or_default(),
                        port
                    ),
                    None => format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default()),
                };
                request.path = parsed.path().to_string();
                request.query = parsed
                    .query_pairs()
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect();
            }
            Err(_) => {
                let (path, _) = url.split_once('?').unwrap_or((url, ""));
                request.path = path.to_string();
            }
        }

        request
    }

    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scopes_flatten_in_order() {
        let mut store = DataStore::new();
        store.insert("title", "Site");
        store.insert("theme", "redwood");

        let mut page = Map::new();
        page.insert("title".to_string(), json!("About"));
        store.merge("page", page);

        assert_eq!(store.get("title"), Some(&json!("About")));
        assert_eq!(
            store.get_all(),
            json!({"title": "About", "theme": "redwood"})
        );
    }

    #[test]
    fn test_from_json() {
        let store = DataStore::from_json(json!({"a": 1}));
        assert_eq!(store.get("a"), Some(&json!(1)));
        assert_eq!(DataStore::from_json(json!("scalar")).get_all(), json!({}));
    }

    #[test]
    fn test_request_parsing() {
        let request = Request::get("https://example.com:8443/blog?page=2&tag=rust")
            .with_header("Accept", "text/html");

        assert_eq!(request.method, "GET");
        assert!(request.secure);
        assert_eq!(request.root, "https://example.com:8443");
        assert_eq!(request.path, "/blog");
        assert_eq!(request.query["page"], "2");
        assert_eq!(request.headers["accept"], "text/html");

        let relative = Request::new("post", "/contact?x=1");
        assert_eq!(relative.method, "POST");
        assert_eq!(relative.path, "/contact");
    }
}
