//! Render-ready decorations and the ranges they invalidate

use crate::model::{Annotation, AnnotationId, Position};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Layer used when neither the annotation nor its type names one
pub const DEFAULT_LAYER: i32 = 0;

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// How an annotation is painted.
///
/// Draw strategies are painted on top of the text by the host; text-style
/// strategies are merged into the text's own styling. `None` is the explicit
/// "do not paint" strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaintStrategy {
    None,
    /// Wavy underline
    Squiggly,
    /// Straight line under the text
    Underline,
    /// Rectangle around the text
    Box,
    DashedBox,
    /// Vertical bar at the start offset
    #[serde(rename = "ibeam")]
    IBeam,
    /// Only drawn in the overview strip and gutter
    Mark,
    /// Background color
    Highlight,
    /// Underline merged into the text style
    TextUnderline,
    Strikethrough,
}

/// Which decoration pool a strategy belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Drawn with a draw call over the text
    Draw,
    /// Merged into the text presentation
    Style,
}

impl PaintStrategy {
    /// `None` for the null strategy
    pub fn kind(self) -> Option<StrategyKind> {
        match self {
            PaintStrategy::None => None,
            PaintStrategy::Squiggly
            | PaintStrategy::Underline
            | PaintStrategy::Box
            | PaintStrategy::DashedBox
            | PaintStrategy::IBeam
            | PaintStrategy::Mark => Some(StrategyKind::Draw),
            PaintStrategy::Highlight
            | PaintStrategy::TextUnderline
            | PaintStrategy::Strikethrough => Some(StrategyKind::Style),
        }
    }

    /// Whether the strategy paints anything over the text itself
    pub fn paints_inline(self) -> bool {
        !matches!(self, PaintStrategy::None | PaintStrategy::Mark)
    }
}

/// The render-ready form of one annotation
#[derive(Debug, Clone)]
pub struct Decoration {
    pub annotation: Arc<Annotation>,
    /// Position as of the synchronization that produced this decoration
    pub position: Position,
    pub color: Rgb,
    pub layer: i32,
    pub strategy: PaintStrategy,
    pub show_in_overview: bool,
    pub show_inline: bool,
}

impl Decoration {
    pub fn id(&self) -> AnnotationId {
        self.annotation.id()
    }

    pub fn kind(&self) -> StrategyKind {
        // Decorations are only built for strategies that paint
        self.strategy.kind().unwrap_or(StrategyKind::Draw)
    }

    /// Same position and appearance, so repainting would change nothing
    pub fn looks_like(&self, other: &Decoration) -> bool {
        self.position == other.position
            && self.color == other.color
            && self.layer == other.layer
            && self.strategy == other.strategy
            && self.show_in_overview == other.show_in_overview
            && self.show_inline == other.show_inline
    }
}

/// A document range that needs repainting.
///
/// Empty means nothing changed. A zero-width dirty range at `X` is not
/// empty: it invalidates the marker drawn at offset `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyRange {
    bounds: Option<(usize, usize)>,
}

impl DirtyRange {
    pub fn empty() -> Self {
        Self { bounds: None }
    }

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            bounds: Some((start.min(end), start.max(end))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn range(&self) -> Option<Range<usize>> {
        self.bounds.map(|(start, end)| start..end)
    }

    /// Grow to include `position`
    pub fn include(&mut self, position: &Position) {
        *self = self.union(DirtyRange::new(position.offset, position.end()));
    }

    pub fn union(self, other: DirtyRange) -> DirtyRange {
        match (self.bounds, other.bounds) {
            (None, _) => other,
            (_, None) => self,
            (Some((a, b)), Some((c, d))) => DirtyRange::new(a.min(c), b.max(d)),
        }
    }

    /// Restrict to `0..=document_length`
    pub fn clamp(self, document_length: usize) -> DirtyRange {
        match self.bounds {
            None => self,
            Some((start, end)) => {
                let start = start.min(document_length);
                let end = end.min(document_length);
                DirtyRange::new(start, end)
            }
        }
    }

    /// Whether `position` lies within the dirty range (bounds inclusive)
    pub fn covers(&self, position: &Position) -> bool {
        self.bounds
            .is_some_and(|(start, end)| start <= position.offset && position.end() <= end)
    }
}
