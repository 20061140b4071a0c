//! Document positions attached to annotations

use std::ops::Range;

/// A range in document offsets, owned by the annotation model.
///
/// The model updates positions in place as the document is edited. A
/// position whose text has been removed entirely is marked `deleted` and
/// must no longer be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub length: usize,
    pub deleted: bool,
}

impl Position {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            deleted: false,
        }
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `offset` lies inside this position.
    ///
    /// An empty position includes nothing.
    pub fn includes(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.end()
    }

    /// Whether this position intersects the query range `start..end`.
    ///
    /// Ranges that merely touch do not overlap, except that an empty position
    /// overlaps any query range that contains or touches its offset. This
    /// keeps zero-length markers visible at their exact offset, including for
    /// a degenerate query `X..X`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        if self.length == 0 {
            return start <= self.offset && self.offset <= end;
        }
        if start == end {
            return self.includes(start);
        }
        self.offset < end && start < self.end()
    }

    /// Update this position for a document edit replacing `deleted_len` bytes
    /// at `edit_offset` with `inserted_len` new bytes.
    ///
    /// Positions after the edit shift, positions overlapping it shrink or grow,
    /// and positions entirely inside the deleted span are marked deleted.
    /// Insertions at the very start of a position push it right; insertions at
    /// its end or strictly inside extend it.
    pub fn apply_edit(&mut self, edit_offset: usize, deleted_len: usize, inserted_len: usize) {
        if self.deleted {
            return;
        }
        let edit_end = edit_offset + deleted_len;
        let start = self.offset;
        let end = self.end();

        // Pure insertion
        if deleted_len == 0 {
            if edit_offset <= start {
                self.offset += inserted_len;
            } else if edit_offset <= end {
                self.length += inserted_len;
            }
            return;
        }

        if edit_end <= start {
            // Edit entirely before
            self.offset = start - deleted_len + inserted_len;
        } else if edit_offset >= end {
            // Edit entirely after; an empty position sitting on a deletion
            // boundary stays where it is.
            if self.length == 0 && edit_offset == start {
                return;
            }
        } else if edit_offset <= start && edit_end >= end {
            // Position swallowed by the deletion
            self.deleted = true;
        } else if edit_offset <= start {
            // Deletion covers the head
            let removed_inside = edit_end - start;
            self.offset = edit_offset + inserted_len;
            self.length -= removed_inside;
        } else {
            // Deletion starts inside; it either stays inside or covers the tail
            let removed_inside = edit_end.min(end) - edit_offset;
            self.length = self.length - removed_inside + inserted_len;
        }
    }
}
