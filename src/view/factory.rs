// ABOUTME: Extension-keyed view factory with lazily resolved engines
// ABOUTME: Finds view files in registered locations and dispatches them to the engine for their extension

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::{Result, ViewEngine, ViewError};
use crate::template::DataStore;

/// Builds an engine the first time a view needs it.
pub type EngineResolver = Box<dyn Fn() -> Result<Arc<dyn ViewEngine>> + Send + Sync>;

struct RegisteredEngine {
    resolver: EngineResolver,
    resolved: Mutex<Option<Arc<dyn ViewEngine>>>,
}

#[derive(Default)]
pub struct ViewFactory {
    /// extension -> engine name, in registration order
    extensions: IndexMap<String, String>,
    engines: HashMap<String, RegisteredEngine>,
    locations: Vec<PathBuf>,
}

impl ViewFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `engine` for files ending in `.{extension}`
    pub fn add_extension(&mut self, extension: &str, engine: &str, resolver: EngineResolver) {
        let extension = extension.trim_start_matches('.').to_string();
        debug!("Registering view extension .{} for engine {}", extension, engine);

        self.extensions.insert(extension, engine.to_string());
        self.engines.insert(
            engine.to_string(),
            RegisteredEngine {
                resolver,
                resolved: Mutex::new(None),
            },
        );
    }

    pub fn add_location(&mut self, location: impl Into<PathBuf>) {
        let location = location.into();
        if !self.locations.contains(&location) {
            self.locations.push(location);
        }
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    /// Name of the engine registered for the longest extension `path` ends with
    pub fn engine_name_for(&self, path: &Path) -> Option<&str> {
        let file_name = path.file_name()?.to_string_lossy();

        self.extensions
            .iter()
            .filter(|(extension, _)| file_name.ends_with(&format!(".{}", extension)))
            .max_by_key(|(extension, _)| extension.len())
            .map(|(_, engine)| engine.as_str())
    }

    /// Resolve an engine by name, building it on first use
    pub fn engine(&self, name: &str) -> Result<Arc<dyn ViewEngine>> {
        let registered = self
            .engines
            .get(name)
            .ok_or_else(|| ViewError::EngineNotFound(name.to_string()))?;

        // A resolver that panicked leaves nothing cached, so the next call retries
        let mut resolved = registered
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(engine) = resolved.as_ref() {
            return Ok(engine.clone());
        }

        debug!("Resolving view engine: {}", name);
        let engine = (registered.resolver)()?;
        *resolved = Some(engine.clone());
        Ok(engine)
    }

    pub fn engine_for(&self, path: &Path) -> Result<Arc<dyn ViewEngine>> {
        let name = self
            .engine_name_for(path)
            .ok_or_else(|| ViewError::UnsupportedExtension(path.display().to_string()))?;
        self.engine(name)
    }

    /// Locate a dotted view name (`blog.post`) under the registered locations
    pub fn find(&self, view: &str) -> Result<PathBuf> {
        let relative = view.replace('.', "/");

        for location in &self.locations {
            for extension in self.extensions.keys() {
                let candidate = location.join(format!("{}.{}", relative, extension));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(ViewError::ViewNotFound(view.to_string()))
    }

    /// Render a view file with the engine registered for its extension
    pub fn render(&self, path: &Path, data: &DataStore) -> Result<String> {
        self.engine_for(path)?.get(path, data)
    }

    /// Find a view by name and render it
    pub fn make(&self, view: &str, data: &DataStore) -> Result<String> {
        let path = self.find(view)?;
        self.render(&path, data)
    }
}
