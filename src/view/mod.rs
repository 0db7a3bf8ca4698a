// ABOUTME: View resolution layer that maps view files to template engines by extension
// ABOUTME: Defines the engine contract, the extension-keyed view factory and the handlebars service provider

pub mod factory;
pub mod provider;

use std::path::Path;
use thiserror::Error;

use crate::template::{DataStore, TemplateError};

pub use factory::{EngineResolver, ViewFactory};
pub use provider::{HandlebarsServiceProvider, ENGINE_NAME};

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("No engine registered for view: {0}")]
    UnsupportedExtension(String),

    #[error("Engine not registered: {0}")]
    EngineNotFound(String),

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub type Result<T> = std::result::Result<T, ViewError>;

/// Renders a view file with the given data.
pub trait ViewEngine: Send + Sync {
    fn get(&self, path: &Path, data: &DataStore) -> Result<String>;
}
