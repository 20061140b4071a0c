//! Error types for caller misuse
//!
//! Stale references (a deleted position, a line lookup that fails because the
//! document moved underneath a paint) are not errors: they surface as `None`
//! and simply mean "nothing to draw". The variants here are precondition
//! violations that indicate a bug in the caller.

use crate::model::{AnnotationId, ListenerId};

/// Misuse of the annotation model or decoration registry APIs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulerError {
    #[error("annotation {0} is already managed by this model")]
    DuplicateAnnotation(AnnotationId),

    #[error("listener {0} is already registered")]
    DuplicateListener(ListenerId),

    #[error("annotation type `{0}` is already registered")]
    DuplicateAnnotationType(String),

    #[error("annotation type key must not be empty")]
    EmptyAnnotationType,

    #[error("range {offset}..{end} lies outside the document (length {document_length})")]
    BadLocation {
        offset: usize,
        end: usize,
        document_length: usize,
    },
}

impl RulerError {
    pub(crate) fn bad_location(offset: usize, length: usize, document_length: usize) -> Self {
        Self::BadLocation {
            offset,
            end: offset.saturating_add(length),
            document_length,
        }
    }
}
