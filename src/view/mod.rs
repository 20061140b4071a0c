//! Rendering core: decoration cache, overview geometry and the paint driver

pub mod decoration;
pub mod decoration_cache;
pub mod decoration_registry;
pub mod geometry;
pub mod render;

pub use decoration::{Decoration, DirtyRange, PaintStrategy, Rgb, StrategyKind, DEFAULT_LAYER};
pub use decoration_cache::{DecorationCache, DecorationPools};
pub use decoration_registry::{Capabilities, DecorationRegistry};
pub use geometry::{line_to_y, lines_in_pixels, y_to_lines, GeometrySnapshot, LineSpan, ScrollMetrics};
pub use render::{
    group_by_layer, InlineInstruction, InlineSegment, InlineViewport, OverviewMark, RulerPainter,
    StyleRun, TextStyle,
};
