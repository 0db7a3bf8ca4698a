// ABOUTME: Content, asset, image, theme and environment functions exposed to templates
// ABOUTME: Each function delegates to a host service and degrades to empty results where lookups miss

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value as JsonValue};
use std::env;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{Result, TemplateError};
use crate::assets::{Asset, AssetRepository};
use crate::config::Settings;
use crate::content::{parse_conditions, ContentKind, ContentRepository};
use crate::imaging::{ImageService, ImageSource, Manipulation};
use crate::storage::Filesystems;
use crate::urls::{ensure_leading_slash, UrlGenerator};

/// Name of the disk holding theme files.
pub const THEME_DISK: &str = "theme";

/// Host services the template functions delegate to.
#[derive(Clone)]
pub struct Services {
    pub content: Arc<dyn ContentRepository>,
    pub assets: Arc<dyn AssetRepository>,
    pub images: Arc<dyn ImageService>,
    pub filesystems: Filesystems,
}

impl Services {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        assets: Arc<dyn AssetRepository>,
        images: Arc<dyn ImageService>,
        filesystems: Filesystems,
    ) -> Self {
        Self {
            content,
            assets,
            images,
            filesystems,
        }
    }
}

/// How a glide source string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    ExternalUrl(String),
    AssetId(String),
    AssetPath(String),
}

/// Classify a glide source string; `site_url` is stripped from local paths
pub fn classify_source(item: &str, site_url: &str) -> SourceKind {
    if UrlGenerator::is_external(item) {
        return SourceKind::ExternalUrl(item.to_string());
    }

    if item.contains("::") {
        return SourceKind::AssetId(item.to_string());
    }

    // Subfolder installs pass the site prefix along with the path
    let path = if !site_url.is_empty() && site_url != "/" {
        item.strip_prefix(site_url).unwrap_or(item)
    } else {
        item
    };
    SourceKind::AssetPath(ensure_leading_slash(path))
}

/// Options of a glide call besides its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlideOptions {
    pub manipulation: Manipulation,
    pub absolute: bool,
}

/// Names accepted by `collection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionNames {
    All,
    Named(Vec<String>),
}

impl CollectionNames {
    /// `"*"`, a `|`-separated string, or a list of strings; anything else is rejected
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(name) if name == "*" => Some(CollectionNames::All),
            JsonValue::String(names) => Some(CollectionNames::Named(
                names.split('|').map(str::to_string).collect(),
            )),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(CollectionNames::Named),
            _ => None,
        }
    }
}

/// Arguments of a `collection` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub names: Option<CollectionNames>,
    pub show_unpublished: bool,
    pub show_published: bool,
    pub show_future: bool,
    pub show_past: bool,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub locale: Option<String>,
    pub conditions: Option<String>,
}

impl CollectionQuery {
    pub fn new(names: Option<CollectionNames>) -> Self {
        Self {
            names,
            show_unpublished: false,
            show_published: true,
            show_future: false,
            show_past: true,
            since: None,
            until: None,
            sort: None,
            limit: None,
            offset: 0,
            locale: None,
            conditions: None,
        }
    }

    /// Query over the named collection(s), using `*` and `|` conventions
    pub fn named(name: &str) -> Self {
        Self::new(CollectionNames::from_json(&JsonValue::String(name.to_string())))
    }
}

/// The function library bound into the template engine.
pub struct TemplateFunctions {
    services: Services,
    settings: Settings,
    urls: UrlGenerator,
}

impl TemplateFunctions {
    pub fn new(services: Services, settings: Settings) -> Self {
        let urls = UrlGenerator::new(settings.clone());
        Self {
            services,
            settings,
            urls,
        }
    }

    pub fn get_asset(&self, id: &str) -> JsonValue {
        match self.services.assets.find(id) {
            Some(asset) => asset.to_array(),
            None => {
                debug!("Asset not found: {}", id);
                empty_object()
            }
        }
    }

    /// Look up content by id, then by URI
    pub fn get_content_of_kind(&self, kind: ContentKind, id: &str) -> JsonValue {
        let content = &self.services.content;
        match content
            .find(kind, id)
            .or_else(|| content.find_by_uri(kind, id))
        {
            Some(item) => item.to_array(None),
            None => {
                debug!("Content not found: {}", id);
                empty_object()
            }
        }
    }

    pub fn get_entry(&self, id: &str) -> JsonValue {
        self.get_content_of_kind(ContentKind::Entry, id)
    }

    pub fn get_page(&self, id: &str) -> JsonValue {
        self.get_content_of_kind(ContentKind::Page, id)
    }

    pub fn get_content(&self, id: &str) -> JsonValue {
        self.get_content_of_kind(ContentKind::Any, id)
    }

    /// Resolve a glide item into something the image service can manipulate
    pub fn normalize_glide_item(&self, item: &JsonValue) -> ImageSource {
        let reference = match item {
            JsonValue::String(reference) => reference,
            JsonValue::Object(_) => {
                return match Asset::from_json(item) {
                    Some(asset) => ImageSource::Asset(asset),
                    None => ImageSource::Missing(item.to_string()),
                }
            }
            other => return ImageSource::Missing(other.to_string()),
        };

        match classify_source(reference, &self.urls.site_url()) {
            SourceKind::ExternalUrl(url) => ImageSource::Url(url),
            SourceKind::AssetId(id) | SourceKind::AssetPath(id) => {
                match self.services.assets.find(&id) {
                    Some(asset) => ImageSource::Asset(asset),
                    None => ImageSource::Missing(id),
                }
            }
        }
    }

    /// Manipulation URL for `item`, or an empty string when the image service fails
    pub fn glide(&self, item: &JsonValue, options: &GlideOptions) -> String {
        let source = self.normalize_glide_item(item);

        let url = match self.services.images.build(&source, &options.manipulation) {
            Ok(url) => url,
            Err(e) => {
                warn!("Image manipulation failed for {}: {}", item, e);
                return String::new();
            }
        };

        if options.absolute {
            self.urls.make_absolute(&url)
        } else {
            self.urls.make_relative(&url)
        }
    }

    /// URL of a file inside the active theme
    pub fn theme(&self, file: &str, cache_bust: bool, absolute: bool) -> Result<String> {
        let disk = self.services.filesystems.disk(THEME_DISK)?;

        // Existing theme files produce an empty URL
        if disk.exists(file) {
            return Ok(String::new());
        }

        let themes_url = self.settings.get_string("system.filesystems.themes.url", "");
        let theme = self.settings.get_string("theming.theme", "default");
        let url = UrlGenerator::assemble(&[themes_url.as_str(), theme.as_str(), file]);

        let locale = self.settings.locale();
        let mut url = self.urls.prepend_site_url(&url, Some(&locale), false);

        if cache_bust {
            url.push_str(&format!("?v={}", disk.last_modified(file)?));
        }

        if !absolute {
            url = self.urls.make_relative(&url);
        }

        Ok(url)
    }

    pub fn env(&self, name: &str, default: JsonValue) -> JsonValue {
        env::var(name).map(JsonValue::String).unwrap_or(default)
    }

    /// Filtered, sorted and paginated entries
    pub fn collection(&self, query: &CollectionQuery) -> Result<Vec<JsonValue>> {
        let names = match query.names {
            Some(ref names) => names,
            None => return Ok(Vec::new()),
        };

        let mut collection = match names {
            CollectionNames::All => self.services.content.all_entries(),
            CollectionNames::Named(names) => self.services.content.where_collection(names),
        };

        if let Some(ref locale) = query.locale {
            collection.localize(locale);
        }

        if !query.show_unpublished {
            collection.remove_unpublished();
        }
        if !query.show_published {
            collection.remove_published();
        }
        if !query.show_future {
            collection.remove_future();
        }
        if !query.show_past {
            collection.remove_past();
        }

        if let Some(since) = query.since {
            collection.remove_before(since);
        }
        if let Some(until) = query.until {
            collection.remove_after(until);
        }

        if let Some(ref conditions) = query.conditions {
            let filters = parse_conditions(conditions)?;
            collection.conditions(&filters)?;
        }

        if let Some(ref sort) = query.sort {
            collection.multisort(sort)?;
        }

        let limit = query.limit.filter(|limit| *limit > 0);
        if query.offset > 0 || limit.is_some() {
            let count = collection.count();
            collection.splice(query.offset, limit.unwrap_or(count));
        }

        let entries = collection.to_array();
        debug!("Collection query returned {} entries", entries.len());
        Ok(entries)
    }
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Map::new())
}

/// Parse a template-supplied timestamp
pub fn parse_timestamp(value: &JsonValue) -> Result<DateTime<Utc>> {
    let invalid = || TemplateError::invalid_argument("timestamp", format!("cannot parse {}", value));

    let text = match value {
        JsonValue::Number(n) => {
            let seconds = n.as_i64().ok_or_else(invalid)?;
            return Utc.timestamp_opt(seconds, 0).single().ok_or_else(invalid);
        }
        JsonValue::String(s) => s.trim(),
        _ => return Err(invalid()),
    };

    let today = Utc::now().date_naive();
    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));

    match text {
        "now" => return Ok(Utc::now()),
        "today" => return midnight(today).ok_or_else(invalid),
        "yesterday" => return midnight(today - Duration::days(1)).ok_or_else(invalid),
        "tomorrow" => return midnight(today + Duration::days(1)).ok_or_else(invalid),
        _ => {}
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return midnight(date).ok_or_else(invalid);
    }
    if let Ok(seconds) = text.parse::<i64>() {
        return Utc.timestamp_opt(seconds, 0).single().ok_or_else(invalid);
    }

    Err(invalid())
}
