//! Ruler configuration loaded from disk

use crate::common::fixtures::ConfigFixture;
use crate::common::harness::RulerTestHarness;
use annotation_ruler::view::{PaintStrategy, Rgb};
use annotation_ruler::{ConfigError, RulerConfig};

#[test]
fn test_custom_types_with_supertype() {
    let fixture = ConfigFixture::new(
        r#"{
            "annotation_types": {
                "lint": { "color": [10, 20, 30], "strategy": "dashed_box", "layer": 7 },
                "lint.minor": { "supertype": "lint", "show_in_overview": false }
            }
        }"#,
    )
    .unwrap();
    let config = RulerConfig::load(&fixture.path).unwrap();

    let mut harness = RulerTestHarness::with_config(100, &config);
    harness.annotate("lint.minor", 3, 0, 4);
    harness.annotate("error", 4, 0, 4); // built-ins replaced
    harness.pump();

    let decorations = harness.decorations();
    assert_eq!(decorations.len(), 1);
    assert_eq!(decorations[0].strategy, PaintStrategy::DashedBox);
    assert_eq!(decorations[0].color, Rgb(10, 20, 30));
    assert_eq!(decorations[0].layer, 7);
    assert!(harness.paint_overview().is_empty());
}

#[test]
fn test_overview_settings_from_file() {
    let fixture = ConfigFixture::new(r#"{ "overview": { "annotation_height": 6, "show_header": false } }"#)
        .unwrap();
    let config = RulerConfig::load(&fixture.path).unwrap();
    assert_eq!(config.overview.annotation_height, 6);

    let mut harness = RulerTestHarness::with_config(100, &config);
    harness.annotate("error", 50, 0, 4);
    harness.pump();
    assert_eq!(harness.painter().overview_header(), None);
    assert_eq!(harness.paint_overview()[0].height, 6);
}

#[test]
fn test_missing_file_is_io_error() {
    let fixture = ConfigFixture::new("{}").unwrap();
    let err = RulerConfig::load(&fixture.missing_path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_invalid_file_is_rejected() {
    let fixture =
        ConfigFixture::new(r#"{ "overview": { "max_thumb_fraction": 1.5 } }"#).unwrap();
    let err = RulerConfig::load(&fixture.path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}
