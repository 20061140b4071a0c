//! Annotation type -> paint capabilities
//!
//! Each annotation type resolves once to a [`Capabilities`] record, walking the
//! supertype chain for anything the type leaves unset. Resolutions are cached
//! until any table changes.

use super::decoration::{PaintStrategy, Rgb};
use crate::config::{AnnotationTypeConfig, RulerConfig};
use crate::error::RulerError;
use std::collections::{HashMap, HashSet};

/// Resolved paint settings of one annotation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub strategy: Option<PaintStrategy>,
    pub color: Option<Rgb>,
    pub layer: Option<i32>,
    pub show_in_overview: bool,
    pub show_inline: bool,
}

#[derive(Debug, Clone)]
struct TypeEntry {
    strategy: Option<PaintStrategy>,
    color: Option<Rgb>,
    layer: Option<i32>,
    supertype: Option<String>,
    show_in_overview: bool,
    show_inline: bool,
}

impl Default for TypeEntry {
    fn default() -> Self {
        Self {
            strategy: None,
            color: None,
            layer: None,
            supertype: None,
            show_in_overview: true,
            show_inline: true,
        }
    }
}

impl From<&AnnotationTypeConfig> for TypeEntry {
    fn from(config: &AnnotationTypeConfig) -> Self {
        Self {
            strategy: config.strategy,
            color: config.color,
            layer: config.layer,
            supertype: config.supertype.clone(),
            show_in_overview: config.show_in_overview,
            show_inline: config.show_inline,
        }
    }
}

/// Type tables plus a cache of resolved capabilities
#[derive(Debug, Clone, Default)]
pub struct DecorationRegistry {
    types: HashMap<String, TypeEntry>,
    resolved: HashMap<String, Option<Capabilities>>,
}

impl DecorationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RulerConfig) -> Self {
        let types = config
            .annotation_types
            .iter()
            .map(|(kind, entry)| (kind.clone(), TypeEntry::from(entry)))
            .collect();
        Self {
            types,
            resolved: HashMap::new(),
        }
    }

    /// Register a new annotation type. Registering a type twice is an error.
    pub fn register_type(
        &mut self,
        kind: &str,
        config: &AnnotationTypeConfig,
    ) -> Result<(), RulerError> {
        if kind.is_empty() {
            return Err(RulerError::EmptyAnnotationType);
        }
        if self.types.contains_key(kind) {
            return Err(RulerError::DuplicateAnnotationType(kind.to_string()));
        }
        self.types.insert(kind.to_string(), TypeEntry::from(config));
        self.invalidate();
        Ok(())
    }

    pub fn set_strategy(&mut self, kind: &str, strategy: Option<PaintStrategy>) {
        self.entry(kind).strategy = strategy;
        self.invalidate();
    }

    pub fn set_color(&mut self, kind: &str, color: Option<Rgb>) {
        self.entry(kind).color = color;
        self.invalidate();
    }

    pub fn set_layer(&mut self, kind: &str, layer: Option<i32>) {
        self.entry(kind).layer = layer;
        self.invalidate();
    }

    pub fn set_supertype(&mut self, kind: &str, supertype: Option<&str>) {
        self.entry(kind).supertype = supertype.map(str::to_string);
        self.invalidate();
    }

    pub fn set_visibility(&mut self, kind: &str, show_in_overview: bool, show_inline: bool) {
        let entry = self.entry(kind);
        entry.show_in_overview = show_in_overview;
        entry.show_inline = show_inline;
        self.invalidate();
    }

    fn entry(&mut self, kind: &str) -> &mut TypeEntry {
        self.types.entry(kind.to_string()).or_default()
    }

    fn invalidate(&mut self) {
        if !self.resolved.is_empty() {
            tracing::debug!(cached = self.resolved.len(), "decoration registry invalidated");
        }
        self.resolved.clear();
    }

    /// Capabilities of `kind`, or `None` for an unknown type
    pub fn resolve(&mut self, kind: &str) -> Option<Capabilities> {
        if let Some(cached) = self.resolved.get(kind) {
            return *cached;
        }
        let resolved = self.compute(kind);
        self.resolved.insert(kind.to_string(), resolved);
        resolved
    }

    fn compute(&self, kind: &str) -> Option<Capabilities> {
        let own = self.types.get(kind)?;
        let mut capabilities = Capabilities {
            strategy: own.strategy,
            color: own.color,
            layer: own.layer,
            show_in_overview: own.show_in_overview,
            show_inline: own.show_inline,
        };

        let mut visited = HashSet::from([kind]);
        let mut next = own.supertype.as_deref();
        while let Some(supertype) = next {
            if !visited.insert(supertype) {
                tracing::trace!(kind, supertype, "supertype cycle, stopping lookup");
                break;
            }
            let Some(parent) = self.types.get(supertype) else {
                break;
            };
            capabilities.strategy = capabilities.strategy.or(parent.strategy);
            capabilities.color = capabilities.color.or(parent.color);
            capabilities.layer = capabilities.layer.or(parent.layer);
            next = parent.supertype.as_deref();
        }
        Some(capabilities)
    }
}
