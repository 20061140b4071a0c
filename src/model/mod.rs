//! Annotation model: annotations, positions, change events, and the
//! document line structure the rendering core reads from.

pub mod annotation;
pub mod annotation_model;
pub mod event;
pub mod line_index;
pub mod position;

pub use annotation::{Annotation, AnnotationId, ListenerId};
pub use annotation_model::{AnnotationIter, AnnotationModel, ModelListener, SimpleAnnotationModel};
pub use event::AnnotationModelEvent;
pub use line_index::{DocumentLines, LineIndex};
pub use position::Position;
