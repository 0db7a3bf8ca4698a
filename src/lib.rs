// ABOUTME: Main library module for the handlebars view integration
// ABOUTME: Exports the template engine, view registration and the host service abstractions

pub mod assets;
pub mod config;
pub mod content;
pub mod imaging;
pub mod storage;
pub mod template;
pub mod urls;
pub mod view;

// Re-export commonly used types
pub use config::{AddonConfig, Config, Settings};
pub use template::{
    DataStore, HandlebarsEngine, Request, Services, TemplateEngineFactory, TemplateError,
    TemplateFunctions,
};
pub use view::{HandlebarsServiceProvider, ViewEngine, ViewError, ViewFactory};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
