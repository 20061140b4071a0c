//! Paint-time driver: turns cached decorations into draw instructions
//!
//! The painter owns the [`DecorationCache`]. On every paint the host hands it
//! a clip region and gets back instructions in paint order:
//!
//! - **Inline**: erasures first, then text-style runs, then draw decorations
//!   in ascending layer order, each split into one segment per visible line.
//! - **Overview**: one rectangle per decoration placed through the
//!   [`GeometrySnapshot`], with identical rectangles in a layer coalesced.
//!
//! Lookups that fail because the document moved under the paint drop the
//! affected decoration; a paint never fails.

use super::decoration::{Decoration, DirtyRange, PaintStrategy, Rgb, StrategyKind};
use super::decoration_cache::DecorationCache;
use super::geometry::{line_to_y, lines_in_pixels, y_to_lines, GeometrySnapshot};
use crate::config::{OverviewConfig, RulerConfig};
use crate::model::{AnnotationId, AnnotationModelEvent, DocumentLines, Position};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// Where the text area currently is, in pixels relative to the clip origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineViewport {
    /// First line at least partially visible
    pub top_line: usize,
    pub line_height: i32,
    /// y of `top_line`; negative when it is scrolled partially out of view
    pub pixel_offset: i32,
}

impl InlineViewport {
    fn line_y(&self, line: usize) -> i32 {
        let rows = line.saturating_sub(self.top_line) as i32;
        self.pixel_offset + rows * self.line_height
    }

    /// Lines intersecting the pixel rows `clip`, capped at `line_count`
    fn lines_in(&self, clip: &Range<i32>, line_count: usize) -> Option<(usize, usize)> {
        if clip.is_empty() || self.line_height <= 0 || line_count == 0 {
            return None;
        }
        let first_row = (clip.start - self.pixel_offset).div_euclid(self.line_height).max(0);
        let last_row = (clip.end - 1 - self.pixel_offset).div_euclid(self.line_height);
        if last_row < 0 {
            return None;
        }
        let first = self.top_line + first_row as usize;
        let last = (self.top_line + last_row as usize).min(line_count - 1);
        (first <= last).then_some((first, last))
    }
}

/// The part of a decoration on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSegment {
    pub line: usize,
    pub offsets: Range<usize>,
    pub y: i32,
    pub height: i32,
}

/// Text attributes merged from style decorations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub background: Option<Rgb>,
    pub underline: Option<Rgb>,
    pub strikethrough: Option<Rgb>,
}

impl TextStyle {
    fn apply(&mut self, strategy: PaintStrategy, color: Rgb) {
        match strategy {
            PaintStrategy::Highlight => self.background = Some(color),
            PaintStrategy::TextUnderline => self.underline = Some(color),
            PaintStrategy::Strikethrough => self.strikethrough = Some(color),
            _ => {}
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == TextStyle::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub offsets: Range<usize>,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineInstruction {
    /// Remove a decoration drawn by an earlier paint
    Erase {
        id: AnnotationId,
        strategy: PaintStrategy,
        segments: Vec<InlineSegment>,
    },
    Style(StyleRun),
    Draw {
        id: AnnotationId,
        strategy: PaintStrategy,
        color: Rgb,
        layer: i32,
        segments: Vec<InlineSegment>,
    },
}

/// One rectangle in the overview strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewMark {
    pub layer: i32,
    pub color: Rgb,
    pub y: i32,
    pub height: i32,
    /// Every annotation drawn by this rectangle
    pub annotations: Vec<AnnotationId>,
}

impl fmt::Display for OverviewMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.annotations.iter().map(ToString::to_string).collect();
        write!(
            f,
            "y={:<4} h={:<3} layer={} {} [{}]",
            self.y,
            self.height,
            self.layer,
            self.color,
            ids.join(", ")
        )
    }
}

/// Split decorations into runs of equal layer, preserving order
pub fn group_by_layer(decorations: Vec<Decoration>) -> Vec<(i32, Vec<Decoration>)> {
    let mut groups: Vec<(i32, Vec<Decoration>)> = Vec::new();
    for decoration in decorations {
        match groups.last_mut() {
            Some((layer, group)) if *layer == decoration.layer => group.push(decoration),
            _ => groups.push((decoration.layer, vec![decoration])),
        }
    }
    groups
}

/// Render driver for inline and overview decorations
pub struct RulerPainter {
    cache: DecorationCache,
    config: OverviewConfig,
    painting_enabled: bool,
}

impl RulerPainter {
    pub fn new(cache: DecorationCache, config: OverviewConfig) -> Self {
        Self {
            cache,
            config,
            painting_enabled: true,
        }
    }

    pub fn from_config(config: &RulerConfig) -> Self {
        Self::new(DecorationCache::from_config(config), config.overview.clone())
    }

    pub fn cache(&self) -> &DecorationCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DecorationCache {
        &mut self.cache
    }

    pub fn config(&self) -> &OverviewConfig {
        &self.config
    }

    pub fn is_painting_enabled(&self) -> bool {
        self.painting_enabled
    }

    /// Apply a model event. Ignored while painting is disabled; re-enabling
    /// resynchronizes.
    pub fn sync(&mut self, event: Option<&AnnotationModelEvent>) -> DirtyRange {
        if !self.painting_enabled {
            tracing::trace!("painting disabled, model event deferred");
            return DirtyRange::empty();
        }
        self.cache.sync(event)
    }

    pub fn set_painting_enabled(&mut self, enabled: bool) -> DirtyRange {
        if self.painting_enabled == enabled {
            return DirtyRange::empty();
        }
        self.painting_enabled = enabled;
        tracing::debug!(enabled, "ruler painting toggled");
        if enabled {
            self.cache.sync(None)
        } else {
            DirtyRange::empty()
        }
    }

    pub fn mark_redrawn(&mut self) -> DirtyRange {
        self.cache.mark_redrawn()
    }

    /// Instructions for the text area rows in `clip`
    pub fn paint_inline(
        &mut self,
        clip: Range<i32>,
        viewport: &InlineViewport,
        lines: &dyn DocumentLines,
    ) -> Vec<InlineInstruction> {
        let _span = tracing::trace_span!("paint_inline").entered();
        if !self.painting_enabled {
            return Vec::new();
        }

        let mut instructions: Vec<InlineInstruction> = Vec::new();
        let visible = viewport.lines_in(&clip, lines.line_count());

        for erased in self.cache.take_erasures() {
            if !erased.show_inline || !erased.strategy.paints_inline() {
                continue;
            }
            let segments = visible
                .map(|range| segments_for(&erased.position, range, viewport, lines))
                .unwrap_or_default();
            instructions.push(InlineInstruction::Erase {
                id: erased.id(),
                strategy: erased.strategy,
                segments,
            });
        }

        let Some((first, last)) = visible else {
            return instructions;
        };
        let (Some(start), Some(end)) = (lines.line_start(first), lines.line_end(last)) else {
            tracing::trace!(first, last, "visible lines no longer in document");
            return instructions;
        };

        let decorations: Vec<Decoration> = self
            .cache
            .decorations_overlapping(start..end)
            .into_iter()
            .filter(|d| d.show_inline && d.strategy.paints_inline())
            .collect();

        let styled: Vec<&Decoration> = decorations
            .iter()
            .filter(|d| d.kind() == StrategyKind::Style)
            .collect();
        instructions.extend(
            merge_style_runs(&styled, start..end)
                .into_iter()
                .map(InlineInstruction::Style),
        );

        let plain: Vec<Decoration> = decorations
            .into_iter()
            .filter(|d| d.kind() == StrategyKind::Draw)
            .collect();
        let mut drawn = 0usize;
        for (layer, group) in group_by_layer(plain) {
            for decoration in group {
                let segments = segments_for(&decoration.position, (first, last), viewport, lines);
                if segments.is_empty() {
                    continue;
                }
                drawn += 1;
                instructions.push(InlineInstruction::Draw {
                    id: decoration.id(),
                    strategy: decoration.strategy,
                    color: decoration.color,
                    layer,
                    segments,
                });
            }
        }
        tracing::trace!(
            first_line = first,
            last_line = last,
            drawn,
            instructions = instructions.len(),
            "inline paint"
        );
        instructions
    }

    /// Marks for the overview strip rows in `clip`
    pub fn paint_overview(
        &self,
        clip: Range<i32>,
        geometry: &GeometrySnapshot,
        lines: &dyn DocumentLines,
    ) -> Vec<OverviewMark> {
        let _span = tracing::trace_span!("paint_overview").entered();
        if !self.painting_enabled {
            return Vec::new();
        }
        if geometry.is_empty() {
            return Vec::new();
        }
        let Some(span) = lines_in_pixels(clip.clone(), geometry) else {
            return Vec::new();
        };
        let (Some(start), Some(end)) = (lines.line_start(span.first), lines.line_end(span.last))
        else {
            return Vec::new();
        };

        let decorations: Vec<Decoration> = self
            .cache
            .decorations_overlapping(start..end)
            .into_iter()
            .filter(|d| d.show_in_overview)
            .collect();

        let mut marks: Vec<OverviewMark> = Vec::new();
        for (layer, group) in group_by_layer(decorations) {
            // Identical rectangles only merge within one layer
            let mut seen: HashMap<(Rgb, i32, i32), usize> = HashMap::new();
            for decoration in group {
                let Some((y, height)) = mark_rect(&decoration.position, geometry, lines) else {
                    continue;
                };
                if y >= clip.end || y + height <= clip.start {
                    continue;
                }
                match seen.get(&(decoration.color, y, height)) {
                    Some(&index) => marks[index].annotations.push(decoration.id()),
                    None => {
                        seen.insert((decoration.color, y, height), marks.len());
                        marks.push(OverviewMark {
                            layer,
                            color: decoration.color,
                            y,
                            height,
                            annotations: vec![decoration.id()],
                        });
                    }
                }
            }
        }
        tracing::trace!(marks = marks.len(), "overview paint");
        marks
    }

    /// Color of the top-most decoration shown in the overview
    pub fn overview_header(&self) -> Option<Rgb> {
        if !self.config.show_header || !self.painting_enabled {
            return None;
        }
        let length = self.cache.model()?.document_length();
        self.cache
            .decorations_overlapping(0..length)
            .into_iter()
            .rev()
            .find(|d| d.show_in_overview)
            .map(|d| d.color)
    }

    /// Decorations whose overview mark covers pixel `y`, top-most first
    pub fn annotations_at(
        &self,
        y: i32,
        geometry: &GeometrySnapshot,
        lines: &dyn DocumentLines,
    ) -> Vec<Decoration> {
        let Some(span) = y_to_lines(y, geometry, true) else {
            return Vec::new();
        };
        let (Some(start), Some(end)) = (lines.line_start(span.first), lines.line_end(span.last))
        else {
            return Vec::new();
        };
        let mut hits: Vec<Decoration> = self
            .cache
            .decorations_overlapping(start..end)
            .into_iter()
            .filter(|d| d.show_in_overview)
            .filter(|d| {
                mark_rect(&d.position, geometry, lines)
                    .is_some_and(|(top, height)| top <= y && y < top + height)
            })
            .collect();
        hits.reverse();
        hits
    }
}

/// First and last line touched by `position`
fn line_range(position: &Position, lines: &dyn DocumentLines) -> Option<(usize, usize)> {
    let first = lines.line_of_offset(position.offset)?;
    let last_offset = position.end() - usize::from(position.length > 0);
    let last = lines.line_of_offset(last_offset)?;
    Some((first, last))
}

/// Overview rectangle `(y, height)` for a position
fn mark_rect(
    position: &Position,
    geometry: &GeometrySnapshot,
    lines: &dyn DocumentLines,
) -> Option<(i32, i32)> {
    let (first, last) = line_range(position, lines)?;
    let y = line_to_y(first, geometry);
    let bottom = line_to_y(last, geometry) + geometry.annotation_height;
    Some((y, bottom - y))
}

/// One segment per visible line covered by `position`
fn segments_for(
    position: &Position,
    (first_visible, last_visible): (usize, usize),
    viewport: &InlineViewport,
    lines: &dyn DocumentLines,
) -> Vec<InlineSegment> {
    let Some((first, last)) = line_range(position, lines) else {
        tracing::trace!(offset = position.offset, "decoration outside document");
        return Vec::new();
    };

    let mut segments = Vec::new();
    for line in first.max(first_visible)..=last.min(last_visible) {
        let (Some(line_start), Some(line_end)) = (lines.line_start(line), lines.line_end(line))
        else {
            return Vec::new();
        };
        let start = position.offset.max(line_start);
        let end = position.end().min(line_end).max(start);
        segments.push(InlineSegment {
            line,
            offsets: start..end,
            y: viewport.line_y(line),
            height: viewport.line_height,
        });
    }
    segments
}

/// Merge style decorations over `window` into non-overlapping runs.
///
/// `decorations` must be in ascending layer order; later ones override
/// earlier ones for the attribute they set.
fn merge_style_runs(decorations: &[&Decoration], window: Range<usize>) -> Vec<StyleRun> {
    let clamp = |offset: usize| offset.clamp(window.start, window.end);
    let mut boundaries: Vec<usize> = vec![window.start, window.end];
    for decoration in decorations {
        boundaries.push(clamp(decoration.position.offset));
        boundaries.push(clamp(decoration.position.end()));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut runs: Vec<StyleRun> = Vec::new();
    for pair in boundaries.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let mut style = TextStyle::default();
        for decoration in decorations {
            let position = &decoration.position;
            if position.offset <= start && end <= position.end() {
                style.apply(decoration.strategy, decoration.color);
            }
        }
        if style.is_plain() {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.offsets.end == start && run.style == style => run.offsets.end = end,
            _ => runs.push(StyleRun {
                offsets: start..end,
                style,
            }),
        }
    }
    runs
}
