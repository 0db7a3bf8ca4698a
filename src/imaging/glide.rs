// ABOUTME: Glide-style manipulation URL builder
// ABOUTME: Encodes sources into route paths, expands presets and optionally signs the URL

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use super::{ImageError, ImageService, ImageSource, Manipulation, Result};
use crate::config::GlideConfig;
use crate::urls::UrlGenerator;

#[derive(Debug, Clone)]
pub struct GlideUrlBuilder {
    route: String,
    sign_key: Option<String>,
    presets: HashMap<String, HashMap<String, String>>,
}

impl GlideUrlBuilder {
    pub fn new(route: &str) -> Self {
        Self {
            route: route.to_string(),
            sign_key: None,
            presets: HashMap::new(),
        }
    }

    pub fn from_config(config: &GlideConfig) -> Self {
        Self {
            route: config.route.clone(),
            sign_key: config.sign_key.clone(),
            presets: config.presets.clone(),
        }
    }

    pub fn with_sign_key(mut self, key: &str) -> Self {
        self.sign_key = Some(key.to_string());
        self
    }

    pub fn with_preset(mut self, name: &str, params: HashMap<String, String>) -> Self {
        self.presets.insert(name.to_string(), params);
        self
    }

    fn source_path(&self, source: &ImageSource) -> Result<String> {
        match source {
            ImageSource::Asset(asset) => Ok(UrlGenerator::assemble(&[
                "/",
                self.route.as_str(),
                "asset",
                URL_SAFE_NO_PAD.encode(asset.id.as_bytes()).as_str(),
            ])),
            ImageSource::Url(url) => Ok(UrlGenerator::assemble(&[
                "/",
                self.route.as_str(),
                "http",
                URL_SAFE_NO_PAD.encode(url.as_bytes()).as_str(),
            ])),
            ImageSource::Missing(reference) => Err(ImageError::SourceNotFound(reference.clone())),
        }
    }

    fn signature(&self, key: &str, path: &str, query: &str) -> String {
        let digest = Sha256::digest(format!("{}:{}?{}", key, path, query).as_bytes());
        format!("{:x}", digest)
    }
}

impl ImageService for GlideUrlBuilder {
    fn build(&self, source: &ImageSource, manipulation: &Manipulation) -> Result<String> {
        if let Some(ref preset) = manipulation.preset {
            if !self.presets.contains_key(preset) {
                return Err(ImageError::UnknownPreset(preset.clone()));
            }
        }

        if manipulation.quality > 100 {
            return Err(ImageError::InvalidParameter {
                name: "quality".to_string(),
                value: manipulation.quality.to_string(),
            });
        }

        let path = self.source_path(source)?;

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in manipulation.params() {
            serializer.append_pair(name, &value);
        }
        let query = serializer.finish();

        let url = match self.sign_key {
            Some(ref key) => {
                let signature = self.signature(key, &path, &query);
                format!("{}?{}&s={}", path, query, signature)
            }
            None => format!("{}?{}", path, query),
        };

        debug!("Built manipulation URL: {}", url);
        Ok(url)
    }
}
