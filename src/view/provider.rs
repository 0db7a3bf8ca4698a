// ABOUTME: Registers the handlebars engine with the view factory at boot
// ABOUTME: Wires configuration, host services, the current request and init hooks into the engine factory

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{ViewEngine, ViewFactory};
use crate::config::Config;
use crate::template::{HandlebarsEngine, InitHook, Request, Services, TemplateEngineFactory};

/// Engine name the configured extension is registered under.
pub const ENGINE_NAME: &str = "handlebars";

/// Registers the handlebars engine for the configured view extension.
///
/// The `request` passed here becomes the engine's `request` global and is
/// fixed for the lifetime of the engine. Hosts that share one `ViewFactory`
/// across requests should put the current request under `request` in the
/// `DataStore`; render data wins over globals.
pub struct HandlebarsServiceProvider {
    config: Config,
    services: Services,
    request: Request,
    root_path: PathBuf,
    hooks: Vec<InitHook>,
}

impl HandlebarsServiceProvider {
    pub fn new(config: Config, services: Services, request: Request, root_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            services,
            request,
            root_path: root_path.into(),
            hooks: Vec::new(),
        }
    }

    /// Customize the engine before its first render
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut HandlebarsEngine) -> crate::template::Result<()> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn factory(&self) -> TemplateEngineFactory {
        TemplateEngineFactory::new(
            self.config.settings.clone(),
            self.config.handlebars.clone(),
            self.request.clone(),
            self.services.clone(),
            self.root_path.clone(),
        )
        .with_hooks(self.hooks.iter().cloned())
    }

    pub fn boot(&self, views: &mut ViewFactory) {
        let factory = self.factory();
        let extension = &self.config.handlebars.extension;

        views.add_location(factory.templates_path());
        views.add_extension(
            extension,
            ENGINE_NAME,
            Box::new(move || {
                let engine = factory.create()?;
                Ok(Arc::new(engine) as Arc<dyn ViewEngine>)
            }),
        );

        info!("Registered {} engine for .{} views", ENGINE_NAME, extension);
    }
}
