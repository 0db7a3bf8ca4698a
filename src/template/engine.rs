// ABOUTME: Handlebars view engine that renders theme templates by absolute path
// ABOUTME: Resolves engine-relative template names, merges globals and renders cached or on-the-fly templates

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::context::DataStore;
use super::error::{Result, TemplateError};
use crate::view::{ViewEngine, ViewError};

pub struct HandlebarsEngine {
    handlebars: Handlebars<'static>,
    template_roots: Vec<PathBuf>,
    globals: Map<String, JsonValue>,
}

impl HandlebarsEngine {
    /// Create an engine searching the given template roots in order
    pub fn new(template_roots: Vec<PathBuf>) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);

        Self {
            handlebars,
            template_roots,
            globals: Map::new(),
        }
    }

    pub fn registry(&self) -> &Handlebars<'static> {
        &self.handlebars
    }

    pub fn registry_mut(&mut self) -> &mut Handlebars<'static> {
        &mut self.handlebars
    }

    /// Expose a value to every template under `name`
    pub fn add_global<T: Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(TemplateError::JsonError)?;
        self.globals.insert(name.to_string(), value);
        Ok(())
    }

    pub fn globals(&self) -> &Map<String, JsonValue> {
        &self.globals
    }

    /// Register a custom helper function
    pub fn register_helper<F>(&mut self, name: &str, helper: F)
    where
        F: handlebars::HelperDef + Send + Sync + 'static,
    {
        self.handlebars.register_helper(name, Box::new(helper));
    }

    /// Compile every template under the roots whose name ends in `.{extension}`
    pub fn register_templates(&mut self, extension: &str) -> Result<usize> {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        let mut registered = 0;

        for root in self.template_roots.clone() {
            if !root.is_dir() {
                debug!("Skipping missing template root: {}", root.display());
                continue;
            }

            for entry in WalkDir::new(&root).follow_links(true) {
                let entry = entry.map_err(|e| TemplateError::IoError(e.into()))?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let name = template_name(&root, entry.path());
                if !name.ends_with(&suffix) || self.handlebars.has_template(&name) {
                    continue;
                }

                self.handlebars.register_template_file(&name, entry.path())?;
                registered += 1;
            }
        }

        debug!("Registered {} templates", registered);
        Ok(registered)
    }

    /// Strip the first matching template root from an absolute path
    pub fn resolve_template_path(&self, absolute_path: &str) -> String {
        for root in &self.template_roots {
            let root = root.to_string_lossy();
            if root.is_empty() {
                continue;
            }

            if let Some(position) = absolute_path.find(root.as_ref()) {
                return absolute_path[position + root.len()..]
                    .trim_start_matches(&['/', '\\'][..])
                    .to_string();
            }
        }

        absolute_path.to_string()
    }

    /// Render a template by engine-relative name or path
    pub fn render(&self, name: &str, data: &JsonValue) -> Result<String> {
        let context = self.context(data);

        if self.handlebars.has_template(name) {
            return self
                .handlebars
                .render(name, &context)
                .map_err(TemplateError::HandlebarsError);
        }

        let path = self.locate(name)?;
        debug!("Compiling uncached template: {}", path.display());
        let source = std::fs::read_to_string(&path)?;
        self.handlebars
            .render_template(&source, &context)
            .map_err(TemplateError::HandlebarsError)
    }

    /// Render a template string; `data` is merged over the engine globals
    pub fn render_template(&self, template: &str, data: &JsonValue) -> Result<String> {
        self.handlebars
            .render_template(template, &self.context(data))
            .map_err(TemplateError::HandlebarsError)
    }

    fn locate(&self, name: &str) -> Result<PathBuf> {
        let candidates = self
            .template_roots
            .iter()
            .map(|root| root.join(name.trim_start_matches(&['/', '\\'][..])))
            .chain(std::iter::once(PathBuf::from(name)));

        for candidate in candidates {
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(TemplateError::NotFound(name.to_string()))
    }

    fn context(&self, data: &JsonValue) -> JsonValue {
        let mut context = self.globals.clone();
        match data {
            JsonValue::Object(map) => {
                for (key, value) in map {
                    context.insert(key.clone(), value.clone());
                }
            }
            JsonValue::Null => {}
            other => {
                context.insert("data".to_string(), other.clone());
            }
        }
        JsonValue::Object(context)
    }
}

impl ViewEngine for HandlebarsEngine {
    fn get(&self, path: &Path, data: &DataStore) -> std::result::Result<String, ViewError> {
        let name = self.resolve_template_path(&path.to_string_lossy());
        debug!("Rendering {} as {}", path.display(), name);
        Ok(self.render(&name, &data.get_all())?)
    }
}

fn template_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
