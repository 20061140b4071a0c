//! Annotation model change events

use super::{Annotation, Position};
use std::sync::Arc;

/// Describes a batch of changes to an annotation model.
///
/// A world-change event carries no reliable diff: receivers must discard
/// whatever they derived from the model and rebuild from a full iteration.
#[derive(Debug, Clone, Default)]
pub struct AnnotationModelEvent {
    pub added: Vec<Arc<Annotation>>,
    /// Removed annotations with the position they had when removed
    pub removed: Vec<(Arc<Annotation>, Option<Position>)>,
    pub changed: Vec<Arc<Annotation>>,
    pub world_change: bool,
}

impl AnnotationModelEvent {
    pub fn world_change() -> Self {
        Self {
            world_change: true,
            ..Self::default()
        }
    }

    /// No additions, removals, or changes, and not a world change
    pub fn is_empty(&self) -> bool {
        !self.world_change
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
    }

    pub(crate) fn annotation_added(&mut self, annotation: Arc<Annotation>) {
        self.added.push(annotation);
    }

    pub(crate) fn annotation_removed(
        &mut self,
        annotation: Arc<Annotation>,
        position: Option<Position>,
    ) {
        // An annotation added and removed within one batch never existed
        // as far as listeners are concerned.
        if let Some(index) = self.added.iter().position(|a| a.id() == annotation.id()) {
            self.added.remove(index);
            self.changed.retain(|a| a.id() != annotation.id());
            return;
        }
        self.changed.retain(|a| a.id() != annotation.id());
        self.removed.push((annotation, position));
    }

    pub(crate) fn annotation_changed(&mut self, annotation: Arc<Annotation>) {
        let id = annotation.id();
        if self.added.iter().any(|a| a.id() == id) || self.changed.iter().any(|a| a.id() == id)
        {
            return;
        }
        self.changed.push(annotation);
    }
}
