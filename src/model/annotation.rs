//! Annotations: typed markers attached to document ranges

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identity token of an annotation.
///
/// Two annotations are the same annotation if and only if their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a model change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// An annotation owned by the annotation model.
///
/// The rendering core only reads annotations. The `deleted` flag is a soft
/// delete: once set the annotation counts as absent everywhere, even if a
/// transient collection (an event, a paint snapshot) still holds it.
#[derive(Debug)]
pub struct Annotation {
    id: AnnotationId,
    kind: String,
    layer: Option<i32>,
    deleted: AtomicBool,
}

impl Annotation {
    pub fn new(id: AnnotationId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            layer: None,
            deleted: AtomicBool::new(false),
        }
    }

    /// Override the paint layer the annotation type would otherwise get
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Annotation type key, e.g. `"error"` or `"search"`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Per-annotation layer, if the annotation carries one
    pub fn layer(&self) -> Option<i32> {
        self.layer
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release);
    }
}
