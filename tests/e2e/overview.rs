//! Overview strip painting and hit testing

use crate::common::harness::RulerTestHarness;
use annotation_ruler::view::line_to_y;

#[test]
fn test_overview_dump() {
    let mut harness = RulerTestHarness::new(100);
    harness.annotate("error", 0, 0, 4);
    harness.annotate("error", 20, 0, 2);
    harness.annotate("error", 20, 5, 2);
    harness.annotate_lines("warning", 50, 51);
    harness.annotate("search", 99, 0, 10);
    harness.pump();

    insta::assert_snapshot!(harness.overview_dump(), @r"
    header #ff0000
    y=95   h=4   layer=0 #ceccf7 [#5]
    y=47   h=5   layer=3 #f4c82d [#4]
    y=0    h=4   layer=4 #ff0000 [#1]
    y=18   h=4   layer=4 #ff0000 [#2, #3]
    ");
}

#[test]
fn test_first_and_last_line_reach_strip_edges() {
    let mut harness = RulerTestHarness::new(10_000).with_size(15, 600);
    harness.annotate("error", 0, 0, 4);
    harness.annotate("warning", 9_999, 0, 4);
    harness.pump();

    let geometry = harness.geometry();
    assert_eq!(geometry.visible_lines, 40.0);

    let marks = harness.paint_overview();
    assert_eq!(marks.len(), 2);
    let bottom = marks.iter().find(|m| m.layer == 3).unwrap();
    let top = marks.iter().find(|m| m.layer == 4).unwrap();
    assert!(top.y <= 1, "{top:?}");
    let bottom_edge = bottom.y + bottom.height;
    assert!((bottom_edge - (geometry.strip_height - 1)).abs() <= 1, "{bottom:?}");
}

#[test]
fn test_hit_testing_finds_annotation_under_pointer() {
    let mut harness = RulerTestHarness::new(1_000);
    let task = harness.annotate("task", 500, 0, 4);
    harness.annotate("error", 10, 0, 4);
    harness.pump();

    let geometry = harness.geometry();
    let y = line_to_y(500, &geometry);
    let hits = harness
        .painter()
        .annotations_at(y + 2, &geometry, harness.lines());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), task.id());
}

#[test]
fn test_hidden_type_stays_out_of_overview() {
    let mut harness = RulerTestHarness::new(100);
    harness.annotate("error", 10, 0, 4);
    harness.pump();
    harness
        .painter_mut()
        .cache_mut()
        .configure(|registry| registry.set_visibility("error", false, true));

    assert!(harness.paint_overview().is_empty());
    assert_eq!(harness.painter().overview_header(), None);
    assert_eq!(harness.paint_inline(0..200).len(), 1);
}
