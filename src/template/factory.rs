// ABOUTME: Builds configured handlebars engines for the active theme
// ABOUTME: Applies engine options, registers globals and the function library, then runs init hooks

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::context::Request;
use super::engine::HandlebarsEngine;
use super::error::{Result, TemplateError};
use super::functions::{Services, TemplateFunctions};
use super::helpers;
use crate::config::{AddonConfig, Settings};

/// Callback run against a freshly built engine before its first use.
pub type InitHook = Arc<dyn Fn(&mut HandlebarsEngine) -> Result<()> + Send + Sync>;

pub struct TemplateEngineFactory {
    settings: Settings,
    options: AddonConfig,
    request: Request,
    services: Services,
    root_path: PathBuf,
    hooks: Vec<InitHook>,
}

impl TemplateEngineFactory {
    pub fn new(
        settings: Settings,
        options: AddonConfig,
        request: Request,
        services: Services,
        root_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings,
            options,
            request,
            services,
            root_path: root_path.into(),
            hooks: Vec::new(),
        }
    }

    /// Add a hook; hooks run in the order they were added
    pub fn with_hook(mut self, hook: InitHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = InitHook>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// `<root>/<themes root>/<theme>/templates`
    pub fn templates_path(&self) -> PathBuf {
        self.root_path
            .join(self.settings.get_string("system.filesystems.themes.root", ""))
            .join(self.settings.get_string("theming.theme", "default"))
            .join("templates")
    }

    pub fn create(&self) -> Result<HandlebarsEngine> {
        let templates_path = self.templates_path();
        let mut engine = HandlebarsEngine::new(vec![templates_path.clone()]);

        {
            let handlebars = engine.registry_mut();
            handlebars.set_strict_mode(self.options.strict_variables);
            // Uncached or debug engines re-read template files on every render
            handlebars.set_dev_mode(self.options.debug || !self.options.cache);

            if self.options.autoescape {
                handlebars.register_escape_fn(handlebars::html_escape);
            } else {
                handlebars.register_escape_fn(handlebars::no_escape);
            }

            if self.options.debug {
                helpers::register_debug_helpers(handlebars);
            }
        }

        engine.add_global("request", &self.request)?;

        let functions = Arc::new(TemplateFunctions::new(
            self.services.clone(),
            self.settings.clone(),
        ));
        helpers::register_functions(engine.registry_mut(), functions);

        let registered = engine.register_templates(&self.options.extension)?;
        info!(
            "Template engine ready: {} templates under {}",
            registered,
            templates_path.display()
        );

        for (index, hook) in self.hooks.iter().enumerate() {
            debug!("Running engine.init hook {}", index);
            hook(&mut engine).map_err(|e| match e {
                TemplateError::InitHookError(_) => e,
                other => TemplateError::InitHookError(other.to_string()),
            })?;
        }

        Ok(engine)
    }
}

impl fmt::Debug for TemplateEngineFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngineFactory")
            .field("options", &self.options)
            .field("root_path", &self.root_path)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
