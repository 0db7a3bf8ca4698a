// ABOUTME: Common fixtures for integration tests
// ABOUTME: Builds a temporary themed site with seeded content, assets and theme disk

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use hbs_views::assets::{Asset, MemoryAssetStore};
use hbs_views::config::{Config, Settings};
use hbs_views::content::{ContentItem, MemoryContentStore};
use hbs_views::imaging::GlideUrlBuilder;
use hbs_views::storage::{Disk, Filesystems, LocalDisk};
use hbs_views::storage::Result as StorageResult;
use hbs_views::template::{HandlebarsEngine, Request, Services, TemplateEngineFactory, TemplateFunctions};

pub const HERO_ID: &str = "main::images/hero.jpg";
pub const HERO_URL: &str = "/assets/images/hero.jpg";
pub const THEME_MTIME: i64 = 1_700_000_000;

/// Theme disk with a fixed set of files and a fixed modification time.
pub struct StubDisk {
    pub files: Vec<String>,
    pub modified: i64,
}

impl StubDisk {
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            modified: THEME_MTIME,
        }
    }

    pub fn with_file(file: &str) -> Self {
        Self {
            files: vec![file.to_string()],
            modified: THEME_MTIME,
        }
    }
}

impl Disk for StubDisk {
    fn exists(&self, path: &str) -> bool {
        self.files.iter().any(|file| file == path)
    }

    fn last_modified(&self, _path: &str) -> StorageResult<i64> {
        Ok(self.modified)
    }
}

fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

pub fn settings() -> Settings {
    Settings::new()
        .with("system.filesystems.themes.root", "site/themes")
        .with("system.filesystems.themes.url", "/site/themes")
        .with("system.locales.en.url", "https://example.com/")
        .with("system.locales.fr.url", "https://example.com/fr/")
        .with("theming.theme", "redwood")
}

pub fn content_store() -> MemoryContentStore {
    let mut store = MemoryContentStore::new()
        .with_item(
            ContentItem::entry("post-1", "blog")
                .with_uri("/blog/an-awesome-start")
                .with_date(days_ago(30))
                .with_data("title", "An Awesome Start")
                .with_data("author", "joe")
                .with_localization("fr", "title", "Un Super Début"),
        )
        .with_item(
            ContentItem::entry("post-2", "blog")
                .with_uri("/blog/second-thoughts")
                .with_date(days_ago(20))
                .with_data("title", "Second Thoughts")
                .with_data("author", "ann"),
        )
        .with_item(
            ContentItem::entry("post-3", "blog")
                .with_uri("/blog/awesome-again")
                .with_date(days_ago(10))
                .with_data("title", "Awesome Again")
                .with_data("author", "joe"),
        )
        .with_item(
            ContentItem::entry("post-4", "blog")
                .with_date(days_ago(5))
                .published(false)
                .with_data("title", "Draft Ideas"),
        )
        .with_item(
            ContentItem::entry("post-5", "blog")
                .with_date(days_ago(-10))
                .with_data("title", "Coming Soon"),
        )
        .with_item(
            ContentItem::entry("news-1", "news")
                .with_date(days_ago(2))
                .with_data("title", "Awesome News"),
        )
        .with_item(ContentItem::page("about", "/about").with_data("title", "About Us"));

    for i in 1..=10 {
        store.insert(
            ContentItem::entry(&format!("arch-{:02}", i), "archive")
                .with_date(days_ago(100 - i))
                .with_data("title", format!("Archive {:02}", i)),
        );
    }

    store
}

pub fn asset_store() -> MemoryAssetStore {
    MemoryAssetStore::new()
        .with_asset(Asset::new("main", "images/hero.jpg", HERO_URL).with_data("alt", "Hero"))
}

pub struct TestSite {
    pub temp_dir: TempDir,
    pub config: Config,
    pub theme_disk: Arc<dyn Disk>,
    pub request: Request,
}

impl TestSite {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.settings = settings();
        config.handlebars.autoescape = false;

        let site = Self {
            theme_disk: Arc::new(StubDisk::empty()),
            request: Request::get("https://example.com/blog?page=2"),
            temp_dir,
            config,
        };
        fs::create_dir_all(site.templates_path()).unwrap();
        site
    }

    pub fn with_theme_disk(mut self, disk: impl Disk + 'static) -> Self {
        self.theme_disk = Arc::new(disk);
        self
    }

    pub fn with_local_theme_disk(mut self) -> Self {
        let theme_root = self.temp_dir.path().join("site/themes/redwood");
        self.theme_disk = Arc::new(LocalDisk::new(theme_root));
        self
    }

    pub fn root_path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn templates_path(&self) -> PathBuf {
        self.temp_dir.path().join("site/themes/redwood/templates")
    }

    pub fn write_template(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.templates_path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn services(&self) -> Services {
        Services::new(
            Arc::new(content_store()),
            Arc::new(asset_store()),
            Arc::new(GlideUrlBuilder::from_config(&self.config.glide)),
            Filesystems::new().with_disk("theme", self.theme_disk.clone()),
        )
    }

    pub fn functions(&self) -> TemplateFunctions {
        TemplateFunctions::new(self.services(), self.config.settings.clone())
    }

    pub fn factory(&self) -> TemplateEngineFactory {
        TemplateEngineFactory::new(
            self.config.settings.clone(),
            self.config.handlebars.clone(),
            self.request.clone(),
            self.services(),
            self.root_path(),
        )
    }

    pub fn engine(&self) -> HandlebarsEngine {
        self.factory().create().unwrap()
    }

    /// Render a template string through a freshly built engine
    pub fn render(&self, template: &str, data: JsonValue) -> String {
        self.engine().render_template(template, &data).unwrap()
    }

    pub fn try_render(&self, template: &str, data: JsonValue) -> Result<String, String> {
        self.engine()
            .render_template(template, &data)
            .map_err(|e| e.to_string())
    }
}
