// ABOUTME: Image manipulation URL building for the glide template function
// ABOUTME: Defines manipulation parameters, image sources and the Glide-style URL builder

pub mod glide;

use thiserror::Error;

use crate::assets::Asset;

pub use glide::GlideUrlBuilder;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image source not found: {0}")]
    SourceNotFound(String),

    #[error("Unknown manipulation preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid manipulation parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// What a manipulation is applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Asset(Asset),
    Url(String),
    /// A reference that could not be resolved to an asset
    Missing(String),
}

/// Manipulation parameters. Unset options leave the image service's defaults alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Manipulation {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub square: Option<u32>,
    pub fit: Option<String>,
    pub crop: Option<String>,
    pub orient: String,
    pub quality: u32,
    pub format: String,
    pub preset: Option<String>,
}

impl Default for Manipulation {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            square: None,
            fit: None,
            crop: None,
            orient: "auto".to_string(),
            quality: 90,
            format: "jpg".to_string(),
            preset: None,
        }
    }
}

impl Manipulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn square(mut self, size: u32) -> Self {
        self.square = Some(size);
        self
    }

    pub fn fit(mut self, fit: &str) -> Self {
        self.fit = Some(fit.to_string());
        self
    }

    pub fn crop(mut self, crop: &str) -> Self {
        self.crop = Some(crop.to_string());
        self
    }

    pub fn orient(mut self, orient: &str) -> Self {
        self.orient = orient.to_string();
        self
    }

    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    pub fn preset(mut self, preset: &str) -> Self {
        self.preset = Some(preset.to_string());
        self
    }

    /// Glide query parameters in a stable order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(ref preset) = self.preset {
            params.push(("p", preset.clone()));
        }

        // A square size wins over explicit dimensions
        let (width, height) = match self.square {
            Some(size) => (Some(size), Some(size)),
            None => (self.width, self.height),
        };
        if let Some(width) = width {
            params.push(("w", width.to_string()));
        }
        if let Some(height) = height {
            params.push(("h", height.to_string()));
        }
        if let Some(ref fit) = self.fit {
            params.push(("fit", fit.clone()));
        }
        if let Some(ref crop) = self.crop {
            params.push(("crop", crop.clone()));
        }

        params.push(("or", self.orient.clone()));
        params.push(("q", self.quality.to_string()));
        params.push(("fm", self.format.clone()));

        params
    }
}

/// Turns a source plus manipulation into a URL serving the transformed image.
pub trait ImageService: Send + Sync {
    fn build(&self, source: &ImageSource, manipulation: &Manipulation) -> Result<String>;
}
