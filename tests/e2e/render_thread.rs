//! Model notifications from other threads

use crate::common::harness::RulerTestHarness;
use annotation_ruler::model::Position;
use std::sync::Arc;
use std::thread;

#[test]
fn test_off_thread_changes_arrive_on_pump() {
    let mut harness = RulerTestHarness::new(100);
    let model = Arc::clone(harness.model());

    thread::spawn(move || {
        for line in [10, 20, 30] {
            model
                .annotate("error", Position::new(line * 11, 4))
                .unwrap();
        }
    })
    .join()
    .unwrap();

    assert!(harness.decorations().is_empty());
    let dirty = harness.pump();
    assert_eq!(dirty.range(), Some(110..334));
    assert_eq!(harness.decorations().len(), 3);
}

#[test]
fn test_concurrent_writers_lose_no_annotations() {
    let mut harness = RulerTestHarness::new(1_000);
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let model = Arc::clone(harness.model());
            thread::spawn(move || {
                for i in 0..25 {
                    let line = w * 250 + i;
                    model
                        .annotate("warning", Position::new(line * 11, 2))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    // Everything arrived while no pump was running, so one resync covers it
    harness.pump();
    assert_eq!(harness.decorations().len(), 100);
}

#[test]
fn test_suppressed_painting_resyncs_on_enable() {
    let mut harness = RulerTestHarness::new(100);
    harness.painter_mut().set_painting_enabled(false);
    harness.annotate("error", 5, 0, 4);
    assert!(harness.pump().is_empty());
    assert!(harness.decorations().is_empty());

    let dirty = harness.painter_mut().set_painting_enabled(true);
    assert_eq!(dirty.range(), Some(55..59));
    assert_eq!(harness.decorations().len(), 1);
}

#[test]
fn test_snapshot_survives_later_sync() {
    let mut harness = RulerTestHarness::new(100);
    harness.annotate("error", 1, 0, 4);
    harness.pump();
    let before = harness.painter().cache().snapshot();

    harness.annotate("error", 2, 0, 4);
    harness.pump();

    assert_eq!(before.len(), 1);
    assert_eq!(harness.painter().cache().snapshot().len(), 2);
}
