//! Line <-> pixel mapping for the overview strip
//!
//! The strip shows every line of the document in a fixed number of pixels and
//! has to travel in step with the scrollbar thumb. Near the top and bottom of
//! the document the mapping is linear at the thumb's scale; in between, the
//! invisible lines are compressed into whatever pixels remain:
//!
//! ```text
//!   line center c = L + 0.5
//!   top     c < V/2            y = c * th / V
//!   middle  V/2 <= c < T - V/2 y = th/2 + (c - V/2) * (H - 1 - th) / (T - V)
//!   bottom  T - V/2 <= c       y = H - 1 - th/2 + (c - (T - V/2)) * th / V
//! ```
//!
//! The three pieces meet at the regime boundaries, so the mapping is
//! continuous and non-decreasing. When the strip is taller than the text area
//! or nothing scrolls, a plain linear map over the writable height is used.
//!
//! Results are shifted up by half a mark and clamped so the whole mark stays
//! inside the strip. [`y_to_lines`] inverts the same snapshot; never mix
//! snapshots from different paints.

use crate::config::OverviewConfig;
use std::ops::Range;

/// Geometry of one paint of the overview strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySnapshot {
    pub total_lines: usize,
    /// Lines that fit in the text area; may be fractional
    pub visible_lines: f64,
    pub thumb_height: i32,
    pub strip_height: i32,
    /// Distance from the top of the text area to the top of the strip
    pub strip_top_offset: i32,
    /// Height of the text area that holds lines
    pub writable_height: i32,
    /// Height of one mark
    pub annotation_height: i32,
}

/// What the host knows about its scrollable text area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub total_lines: usize,
    pub line_height: i32,
    pub client_height: i32,
    pub top_margin: i32,
    pub bottom_margin: i32,
    pub strip_height: i32,
    pub strip_top_offset: i32,
    /// Thumb height reported by the host's scrollbar, if it has one
    pub thumb_height: Option<i32>,
}

impl GeometrySnapshot {
    /// Snapshot with the text area exactly as tall as the strip
    pub fn new(total_lines: usize, visible_lines: f64, thumb_height: i32, strip_height: i32) -> Self {
        Self {
            total_lines,
            visible_lines,
            thumb_height,
            strip_height,
            strip_top_offset: 0,
            writable_height: strip_height,
            annotation_height: OverviewConfig::default().annotation_height,
        }
    }

    pub fn with_annotation_height(mut self, annotation_height: i32) -> Self {
        self.annotation_height = annotation_height;
        self
    }

    pub fn with_writable_height(mut self, writable_height: i32, strip_top_offset: i32) -> Self {
        self.writable_height = writable_height;
        self.strip_top_offset = strip_top_offset;
        self
    }

    /// Derive the snapshot from the host's current scroll state.
    ///
    /// Without a host thumb the thumb is sized like a scrollbar's:
    /// proportional to the visible fraction, at least `min_thumb_height`, at
    /// most `max_thumb_fraction` of the strip, and the whole strip when the
    /// document fits.
    pub fn from_scroll(metrics: &ScrollMetrics, config: &OverviewConfig) -> Self {
        let visible_lines = if metrics.line_height > 0 {
            f64::from(metrics.client_height.max(0)) / f64::from(metrics.line_height)
        } else {
            0.0
        };
        let writable_height =
            (metrics.client_height - metrics.top_margin - metrics.bottom_margin).max(0);
        let strip_height = metrics.strip_height.max(0);

        let thumb_height = metrics.thumb_height.unwrap_or_else(|| {
            let total = metrics.total_lines as f64;
            if total <= visible_lines {
                return strip_height;
            }
            let raw = (visible_lines / total * f64::from(strip_height)).ceil() as i32;
            let max_thumb = (f64::from(strip_height) * config.max_thumb_fraction).floor() as i32;
            raw.max(config.min_thumb_height).min(max_thumb).min(strip_height)
        });

        Self {
            total_lines: metrics.total_lines,
            visible_lines,
            thumb_height,
            strip_height,
            strip_top_offset: metrics.strip_top_offset,
            writable_height,
            annotation_height: config.annotation_height,
        }
    }

    /// No pixel row lies both inside the strip and beside the text area.
    ///
    /// Nothing can be placed or hit in such a snapshot.
    pub fn is_empty(&self) -> bool {
        self.strip_height.min(self.writable_height) <= 0
    }

    /// Strip taller than the text, or no invisible lines
    fn is_linear(&self) -> bool {
        self.strip_height > self.writable_height || self.total_lines as f64 <= self.visible_lines
    }

    /// Largest y a mark may start at
    fn max_y(&self) -> i32 {
        (self.strip_height - 1 - self.annotation_height).max(0)
    }

    fn thumb(&self) -> f64 {
        f64::from(self.thumb_height.clamp(0, (self.strip_height - 1).max(0)))
    }

    /// Unclamped, uncentered pixel of a line center
    fn raw_y(&self, center: f64) -> f64 {
        let total = self.total_lines as f64;
        if self.is_linear() {
            return center * f64::from(self.writable_height) / total
                - f64::from(self.strip_top_offset);
        }

        let visible = self.visible_lines;
        let half_visible = visible / 2.0;
        let thumb = self.thumb();
        let last = f64::from(self.strip_height - 1);
        if center < half_visible {
            center * thumb / visible
        } else if center < total - half_visible {
            thumb / 2.0 + (center - half_visible) * (last - thumb) / (total - visible)
        } else {
            last - thumb / 2.0 + (center - (total - half_visible)) * thumb / visible
        }
    }

    /// Line center whose raw pixel is `y`. Only an estimate for the exact
    /// search in [`y_to_lines`].
    fn raw_center(&self, y: f64) -> f64 {
        let total = self.total_lines as f64;
        if self.is_linear() {
            if self.writable_height <= 0 {
                return 0.0;
            }
            return (y + f64::from(self.strip_top_offset)) * total / f64::from(self.writable_height);
        }

        let visible = self.visible_lines;
        let half_visible = visible / 2.0;
        let thumb = self.thumb();
        let last = f64::from(self.strip_height - 1);
        let middle_height = last - thumb;
        if y < thumb / 2.0 {
            y * visible / thumb
        } else if y < last - thumb / 2.0 {
            if middle_height <= 0.0 {
                half_visible
            } else {
                half_visible + (y - thumb / 2.0) * (total - visible) / middle_height
            }
        } else if thumb <= 0.0 {
            total
        } else {
            total - half_visible + (y - (last - thumb / 2.0)) * visible / thumb
        }
    }

    fn y_of(&self, line: usize) -> i32 {
        let centered = self.raw_y(line as f64 + 0.5) - f64::from(self.annotation_height) / 2.0;
        (centered.floor() as i32).clamp(0, self.max_y())
    }

    /// Estimated line whose center maps to raw pixel `y`
    fn estimate_line(&self, y: f64) -> usize {
        let line = (self.raw_center(y) - 0.5).round();
        if line.is_nan() || line <= 0.0 {
            0
        } else {
            (line as usize).min(self.total_lines.saturating_sub(1))
        }
    }

    /// First line whose mark starts at or below pixel `lo`
    fn first_line_from(&self, lo: i32) -> Option<usize> {
        let last = self.total_lines.checked_sub(1)?;
        if lo <= 0 {
            return Some(0);
        }
        if self.y_of(last) < lo {
            return None;
        }
        let mut line = self.estimate_line(f64::from(lo) + f64::from(self.annotation_height) / 2.0);
        while line > 0 && self.y_of(line - 1) >= lo {
            line -= 1;
        }
        while self.y_of(line) < lo {
            line += 1;
        }
        Some(line)
    }

    /// Last line whose mark starts at or above pixel `hi`
    fn last_line_to(&self, hi: i32) -> Option<usize> {
        let last = self.total_lines.checked_sub(1)?;
        if hi >= self.max_y() {
            return Some(last);
        }
        if self.y_of(0) > hi {
            return None;
        }
        let mut line =
            self.estimate_line(f64::from(hi + 1) + f64::from(self.annotation_height) / 2.0);
        while line < last && self.y_of(line + 1) <= hi {
            line += 1;
        }
        while self.y_of(line) > hi {
            line -= 1;
        }
        Some(line)
    }
}

/// Inclusive range of document lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

impl LineSpan {
    pub fn contains(&self, line: usize) -> bool {
        self.first <= line && line <= self.last
    }
}

/// Top pixel of the mark for `line`.
///
/// Always inside `[0, strip_height - 1 - annotation_height]`, floored at 0.
/// For an empty snapshot (see [`GeometrySnapshot::is_empty`]) every line maps
/// to 0 and [`y_to_lines`] finds nothing there; callers skip painting.
pub fn line_to_y(line: usize, geometry: &GeometrySnapshot) -> i32 {
    if geometry.total_lines == 0 {
        return 0;
    }
    geometry.y_of(line.min(geometry.total_lines - 1))
}

/// Lines whose marks are hit at pixel `y`.
///
/// With `exact` only marks covering `y` count. Otherwise a mark drawn at `y`
/// is matched against every mark it touches, which is what painting and
/// hover tolerance want. `None` when `y` lies outside the strip or the text
/// area, or no mark reaches it.
pub fn y_to_lines(y: i32, geometry: &GeometrySnapshot, exact: bool) -> Option<LineSpan> {
    if geometry.is_empty() || y < 0 || y >= geometry.strip_height.min(geometry.writable_height) {
        return None;
    }
    let rows = if exact {
        y..y + 1
    } else {
        y..y + geometry.annotation_height.max(1)
    };
    let span = lines_in_pixels(rows, geometry);
    if span.is_none() {
        tracing::trace!(y, "no overview line at pixel");
    }
    span
}

/// Lines whose marks intersect the pixel rows `rows`
pub fn lines_in_pixels(rows: Range<i32>, geometry: &GeometrySnapshot) -> Option<LineSpan> {
    if rows.is_empty() || geometry.total_lines == 0 {
        return None;
    }
    let height = geometry.annotation_height.max(1);
    let first = geometry.first_line_from(rows.start - height + 1)?;
    let last = geometry.last_line_to(rows.end - 1)?;
    (first <= last).then_some(LineSpan { first, last })
}
