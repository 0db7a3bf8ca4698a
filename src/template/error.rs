// ABOUTME: Error types for template engine operations
// ABOUTME: Defines errors raised while building engines, resolving templates and running template functions

use thiserror::Error;

use crate::content::ContentError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template render error: {0}")]
    RenderError(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Engine init hook failed: {0}")]
    InitHookError(String),

    #[error("Content query error: {0}")]
    ContentError(#[from] ContentError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Handlebars error: {0}")]
    HandlebarsError(#[from] handlebars::RenderError),

    #[error("Handlebars template error: {0}")]
    HandlebarsTemplateError(#[from] handlebars::TemplateError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TemplateError {
    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        TemplateError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
