//! Inline decorations over the visible text

use crate::common::harness::RulerTestHarness;
use annotation_ruler::model::Position;
use annotation_ruler::view::InlineInstruction;

fn draws(instructions: &[InlineInstruction]) -> Vec<&InlineInstruction> {
    instructions
        .iter()
        .filter(|i| matches!(i, InlineInstruction::Draw { .. }))
        .collect()
}

#[test]
fn test_scrolled_viewport_positions_segments() {
    let mut harness = RulerTestHarness::new(100);
    harness.annotate("error", 6, 0, 4);
    harness.annotate("error", 40, 0, 4);
    harness.pump();

    let viewport = harness.viewport(5, -3);
    let instructions = harness.paint_inline_at(0..50, &viewport);

    let [InlineInstruction::Draw { segments, .. }] = instructions.as_slice() else {
        panic!("unexpected instructions: {instructions:?}");
    };
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].line, 6);
    assert_eq!(segments[0].y, 7);
}

#[test]
fn test_inserted_line_moves_segment_down() {
    let mut harness = RulerTestHarness::new(20);
    harness.annotate("warning", 3, 0, 4);
    harness.pump();

    harness.insert(0, "new line\n");
    harness.pump();

    let instructions = harness.paint_inline(0..200);
    let [InlineInstruction::Draw { segments, .. }] = instructions.as_slice() else {
        panic!("unexpected instructions: {instructions:?}");
    };
    assert_eq!(segments[0].line, 4);
    assert_eq!(segments[0].y, 40);
}

#[test]
fn test_removed_decoration_is_erased_once() {
    let mut harness = RulerTestHarness::new(20);
    let error = harness.annotate("error", 2, 0, 4);
    harness.pump();
    assert_eq!(draws(&harness.paint_inline(0..200)).len(), 1);

    harness.model().remove_annotation(error.id());
    harness.pump();
    let instructions = harness.paint_inline(0..200);
    assert!(matches!(
        instructions.as_slice(),
        [InlineInstruction::Erase { id, segments, .. }] if *id == error.id() && segments.len() == 1
    ));

    assert!(harness.paint_inline(0..200).is_empty());
}

#[test]
fn test_style_runs_precede_draws() {
    let mut harness = RulerTestHarness::new(20);
    harness.annotate("error", 1, 0, 4);
    harness.annotate("search", 1, 0, 4);
    harness.pump();

    let instructions = harness.paint_inline(0..200);
    assert_eq!(instructions.len(), 2);
    assert!(matches!(instructions[0], InlineInstruction::Style(_)));
    assert!(matches!(instructions[1], InlineInstruction::Draw { .. }));
}

#[test]
fn test_clip_outside_document_draws_nothing() {
    let mut harness = RulerTestHarness::new(5);
    harness.annotate("error", 1, 0, 4);
    harness.pump();
    assert!(harness.paint_inline(100..200).is_empty());
}

/// Text inserted above a painted mark moves it without a model event; removing
/// it afterwards must erase and invalidate where it was painted
#[test]
fn test_removal_after_insert_erases_moved_segment() {
    let mut harness = RulerTestHarness::new(20);
    let error = harness.annotate("error", 2, 0, 4);
    harness.pump();

    harness.insert(0, "new line\n");
    harness.pump();
    assert_eq!(draws(&harness.paint_inline(0..200)).len(), 1);

    harness.model().remove_annotation(error.id());
    let dirty = harness.pump();
    let moved = Position::new(RulerTestHarness::offset(2, 0) + 9, 4);
    assert!(dirty.covers(&moved), "{dirty:?}");

    let instructions = harness.paint_inline(0..200);
    let [InlineInstruction::Erase { id, segments, .. }] = instructions.as_slice() else {
        panic!("unexpected instructions: {instructions:?}");
    };
    assert_eq!(*id, error.id());
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].line, 3);
    assert_eq!(segments[0].offsets, moved.range());
}
