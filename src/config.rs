//! Ruler configuration
//!
//! Loaded from JSON. Every section has defaults: an empty object `{}` yields
//! the default overview settings and the built-in annotation types. A config
//! that lists `annotation_types` replaces the built-in table entirely.

use crate::view::decoration::{PaintStrategy, Rgb};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Overview strip settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OverviewConfig {
    /// Height of one annotation mark in pixels
    pub annotation_height: i32,
    /// Smallest scrollbar thumb, in pixels, when the host does not report one
    pub min_thumb_height: i32,
    /// Largest scrollbar thumb as a fraction of the strip height
    pub max_thumb_fraction: f64,
    /// Whether the overview header shows the top-most annotation color
    pub show_header: bool,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            annotation_height: 4,
            min_thumb_height: 8,
            max_thumb_fraction: 0.8,
            show_header: true,
        }
    }
}

/// How annotations of one type are decorated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationTypeConfig {
    /// Mark color; a type without a color is not drawn
    #[serde(default)]
    pub color: Option<Rgb>,
    /// Unset inherits from the supertype; `"none"` explicitly disables painting
    #[serde(default)]
    pub strategy: Option<PaintStrategy>,
    /// Paint order; larger draws on top
    #[serde(default)]
    pub layer: Option<i32>,
    /// Type to inherit unset color, strategy and layer from
    #[serde(default)]
    pub supertype: Option<String>,
    #[serde(default = "default_true")]
    pub show_in_overview: bool,
    #[serde(default = "default_true")]
    pub show_inline: bool,
}

fn default_true() -> bool {
    true
}

impl AnnotationTypeConfig {
    pub fn new(color: Rgb, strategy: PaintStrategy, layer: i32) -> Self {
        Self {
            color: Some(color),
            strategy: Some(strategy),
            layer: Some(layer),
            supertype: None,
            show_in_overview: true,
            show_inline: true,
        }
    }
}

/// Top-level ruler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RulerConfig {
    pub overview: OverviewConfig,
    pub annotation_types: BTreeMap<String, AnnotationTypeConfig>,
}

impl Default for RulerConfig {
    fn default() -> Self {
        let mut annotation_types = BTreeMap::new();
        annotation_types.insert(
            "error".to_string(),
            AnnotationTypeConfig::new(Rgb(255, 0, 0), PaintStrategy::Squiggly, 4),
        );
        annotation_types.insert(
            "warning".to_string(),
            AnnotationTypeConfig::new(Rgb(244, 200, 45), PaintStrategy::Squiggly, 3),
        );
        annotation_types.insert(
            "info".to_string(),
            AnnotationTypeConfig::new(Rgb(80, 140, 230), PaintStrategy::Underline, 2),
        );
        annotation_types.insert(
            "task".to_string(),
            AnnotationTypeConfig::new(Rgb(120, 180, 220), PaintStrategy::Mark, 1),
        );
        annotation_types.insert(
            "bookmark".to_string(),
            AnnotationTypeConfig::new(Rgb(40, 80, 200), PaintStrategy::Mark, 1),
        );
        annotation_types.insert(
            "search".to_string(),
            AnnotationTypeConfig::new(Rgb(206, 204, 247), PaintStrategy::Highlight, 0),
        );
        Self {
            overview: OverviewConfig::default(),
            annotation_types,
        }
    }
}

impl RulerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::debug!(
            path = %path.display(),
            types = config.annotation_types.len(),
            "loaded ruler config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let overview = &self.overview;
        if overview.annotation_height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "overview.annotation_height must be positive, got {}",
                overview.annotation_height
            )));
        }
        if overview.min_thumb_height < 0 {
            return Err(ConfigError::Invalid(format!(
                "overview.min_thumb_height must not be negative, got {}",
                overview.min_thumb_height
            )));
        }
        if !(overview.max_thumb_fraction > 0.0 && overview.max_thumb_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "overview.max_thumb_fraction must be in (0, 1], got {}",
                overview.max_thumb_fraction
            )));
        }
        if self.annotation_types.contains_key("") {
            return Err(ConfigError::Invalid(
                "annotation type keys must not be empty".to_string(),
            ));
        }

        for start in self.annotation_types.keys() {
            let mut seen = BTreeSet::new();
            let mut current = Some(start.as_str());
            while let Some(kind) = current {
                if !seen.insert(kind) {
                    return Err(ConfigError::Invalid(format!(
                        "supertype cycle through annotation type `{kind}`"
                    )));
                }
                current = self
                    .annotation_types
                    .get(kind)
                    .and_then(|c| c.supertype.as_deref());
            }
        }
        Ok(())
    }
}
