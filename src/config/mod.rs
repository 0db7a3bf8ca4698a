// ABOUTME: Configuration management for the handlebars view integration
// ABOUTME: Loads host settings, engine options, glide and logging configuration from YAML and env

pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub use settings::Settings;

/// File extension views must carry to be rendered by the handlebars engine.
pub const DEFAULT_EXTENSION: &str = "html.hbs";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub handlebars: AddonConfig,

    #[serde(default)]
    pub glide: GlideConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Options handed to the engine factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonConfig {
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub strict_variables: bool,

    #[serde(default = "default_true")]
    pub autoescape: bool,

    #[serde(default = "default_true")]
    pub cache: bool,

    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlideConfig {
    #[serde(default = "default_glide_route")]
    pub route: String,

    #[serde(default)]
    pub sign_key: Option<String>,

    #[serde(default)]
    pub presets: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_true() -> bool {
    true
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_glide_route() -> String {
    "img".to_string()
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            debug: false,
            strict_variables: false,
            autoescape: true,
            cache: true,
            extension: default_extension(),
        }
    }
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            route: default_glide_route(),
            sign_key: None,
            presets: HashMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_yaml(&contents)?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document without touching the environment
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("hbs-views.yaml"),
            PathBuf::from("hbs-views.yml"),
            PathBuf::from(".hbs-views.yaml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".hbs-views").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from("hbs-views.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(debug) = std::env::var("HBS_VIEWS_DEBUG") {
            self.handlebars.debug = debug.parse()?;
        }
        if let Ok(strict) = std::env::var("HBS_VIEWS_STRICT_VARIABLES") {
            self.handlebars.strict_variables = strict.parse()?;
        }
        if let Ok(autoescape) = std::env::var("HBS_VIEWS_AUTOESCAPE") {
            self.handlebars.autoescape = autoescape.parse()?;
        }
        if let Ok(cache) = std::env::var("HBS_VIEWS_CACHE") {
            self.handlebars.cache = cache.parse()?;
        }
        if let Ok(sign_key) = std::env::var("HBS_VIEWS_GLIDE_SIGN_KEY") {
            self.glide.sign_key = Some(sign_key);
        }

        if let Ok(level) = std::env::var("HBS_VIEWS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("HBS_VIEWS_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}

/// Install a global tracing subscriber for the configured level and format
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let result = match logging.format.as_str() {
        "compact" => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!("Logging initialized with level: {}", logging.level);
    Ok(())
}
