// ABOUTME: Template engine module for the handlebars view integration
// ABOUTME: Provides the engine adapter, its factory, render context and the template function library

pub mod context;
pub mod engine;
pub mod error;
pub mod factory;
pub mod functions;
pub mod helpers;

pub use context::{DataStore, Request};
pub use engine::HandlebarsEngine;
pub use error::{Result, TemplateError};
pub use factory::{InitHook, TemplateEngineFactory};
pub use functions::{CollectionQuery, GlideOptions, Services, TemplateFunctions};
