//! Decoration cache kept in sync with a live model

use crate::common::harness::RulerTestHarness;
use annotation_ruler::model::{Annotation, AnnotationModel, Position};
use annotation_ruler::view::PaintStrategy;
use std::sync::Arc;

/// A world change leaves exactly one decoration per drawable annotation
#[test]
fn test_world_change_rebuilds_from_model() {
    let mut harness = RulerTestHarness::new(50);
    let kept = harness.annotate("error", 1, 0, 4);
    let dropped = harness.annotate("warning", 2, 0, 4);
    harness.annotate("note", 3, 0, 4); // no such type, never decorated
    harness.pump();
    assert_eq!(harness.decorations().len(), 2);

    let length = harness.text().len();
    harness.model().batch(|m| {
        m.remove_annotation(dropped.id());
        m.set_document_length(length);
    });
    let dirty = harness.pump();

    assert_eq!(dirty.range(), Some(0..length));
    let ids: Vec<_> = harness.decorations().iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec![kept.id()]);
}

#[test]
fn test_removal_dirties_former_position() {
    let mut harness = RulerTestHarness::new(50);
    let annotation = harness.annotate("error", 10, 2, 5);
    harness.pump();

    harness.model().remove_annotation(annotation.id());
    let dirty = harness.pump();

    let former = Position::new(RulerTestHarness::offset(10, 2), 5);
    assert!(dirty.covers(&former), "{dirty:?}");
    assert!(harness.decorations().is_empty());
}

#[test]
fn test_insertion_before_annotation_moves_decoration() {
    let mut harness = RulerTestHarness::new(50);
    harness.annotate("info", 10, 0, 4);
    harness.pump();

    harness.insert(0, "abc");
    harness.pump();

    let decorations = harness.decorations();
    assert_eq!(decorations.len(), 1);
    assert_eq!(
        decorations[0].position.offset,
        RulerTestHarness::offset(10, 0) + 3
    );
}

#[test]
fn test_deleting_annotated_text_removes_decoration() {
    let mut harness = RulerTestHarness::new(50);
    let doomed = harness.annotate("error", 10, 2, 3);
    harness.annotate("error", 20, 0, 3);
    harness.pump();

    harness.delete(RulerTestHarness::offset(10, 0), 11);
    let dirty = harness.pump();

    assert!(!dirty.is_empty());
    assert!(doomed.is_deleted());
    let decorations = harness.decorations();
    assert_eq!(decorations.len(), 1);
    assert_eq!(decorations[0].position.offset, RulerTestHarness::offset(19, 0));
}

#[test]
fn test_resync_after_pump_is_idempotent() {
    let mut harness = RulerTestHarness::new(50);
    harness.annotate("error", 1, 0, 4);
    harness.annotate("search", 4, 2, 2);
    harness.annotate("task", 7, 0, 0);
    harness.pump();

    let cache = harness.painter_mut().cache_mut();
    assert!(cache.sync(None).is_empty());
    assert!(cache.sync(None).is_empty());
}

#[test]
fn test_replace_annotations_applies_in_one_pump() {
    let mut harness = RulerTestHarness::new(50);
    let old = harness.annotate("error", 1, 0, 4);
    harness.pump();

    let model = Arc::clone(harness.model());
    let replacement = Arc::new(Annotation::new(model.next_id(), "info"));
    model
        .replace_annotations(
            &[old.id()],
            vec![(Arc::clone(&replacement), Position::new(30, 2))],
        )
        .unwrap();
    harness.pump();

    let decorations = harness.decorations();
    assert_eq!(decorations.len(), 1);
    assert_eq!(decorations[0].id(), replacement.id());
    assert_eq!(decorations[0].strategy, PaintStrategy::Underline);
    assert_eq!(model.modification_stamp(), 2);
}

#[test]
fn test_reconfiguring_type_updates_decorations() {
    let mut harness = RulerTestHarness::new(50);
    let warning = harness.annotate("warning", 5, 0, 4);
    harness.annotate("error", 6, 0, 4);
    harness.pump();

    let dirty = harness.painter_mut().cache_mut().set_color("warning", None);

    assert_eq!(dirty.range(), Some(Position::new(55, 4).range()));
    assert!(harness.decorations().iter().all(|d| d.id() != warning.id()));
    assert_eq!(harness.decorations().len(), 1);
}
