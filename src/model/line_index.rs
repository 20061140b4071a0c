//! Line number <-> byte offset mapping for the document being decorated

/// Read access to the document's line structure.
///
/// Lookups return `None` when the document changed between the caller
/// computing an offset and asking for it. Painting treats that as
/// "nothing to draw" rather than an error.
pub trait DocumentLines {
    /// Document length in bytes
    fn length(&self) -> usize;

    /// Number of lines; an empty document has one (empty) line
    fn line_count(&self) -> usize;

    /// 0-indexed line containing `offset` (`offset == length` is the last line)
    fn line_of_offset(&self, offset: usize) -> Option<usize>;

    /// Byte offset where `line` starts
    fn line_start(&self, line: usize) -> Option<usize>;

    /// Byte offset where `line` ends, including its line delimiter
    fn line_end(&self, line: usize) -> Option<usize>;
}

/// Line start offsets of a document, updated incrementally on edits.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Offsets where each line starts; always begins with 0
    line_starts: Vec<usize>,
    length: usize,
}

impl LineIndex {
    /// Build the index for an empty document
    pub fn new() -> Self {
        Self {
            line_starts: vec![0],
            length: 0,
        }
    }

    pub fn from_str(text: &str) -> Self {
        let mut index = Self::new();
        index.handle_insertion(0, text);
        index
    }

    /// Shift line starts after an insertion and add the new ones.
    pub fn handle_insertion(&mut self, insert_byte: usize, text: &str) {
        let insert_byte = insert_byte.min(self.length);
        let inserted_bytes = text.len();

        // Lines starting after the insertion point move right
        let first_after = self.line_starts.partition_point(|&s| s <= insert_byte);
        for start in &mut self.line_starts[first_after..] {
            *start += inserted_bytes;
        }

        let new_starts: Vec<usize> = text
            .match_indices('\n')
            .map(|(i, _)| insert_byte + i + 1)
            .collect();
        self.line_starts
            .splice(first_after..first_after, new_starts);
        self.length += inserted_bytes;
    }

    /// Drop line starts inside a deleted range and shift the ones after it.
    pub fn handle_deletion(&mut self, delete_start: usize, deleted_bytes: usize) {
        let delete_start = delete_start.min(self.length);
        let deleted_bytes = deleted_bytes.min(self.length - delete_start);
        let delete_end = delete_start + deleted_bytes;

        // A line start in (start, end] was preceded by a deleted newline
        let first_removed = self.line_starts.partition_point(|&s| s <= delete_start);
        let first_kept = self.line_starts.partition_point(|&s| s <= delete_end);
        self.line_starts.drain(first_removed..first_kept);

        for start in &mut self.line_starts[first_removed..] {
            *start -= deleted_bytes;
        }
        self.length -= deleted_bytes;
    }

    /// Apply a replace edit: delete `deleted_bytes` at `offset`, then insert `text`
    pub fn apply_edit(&mut self, offset: usize, deleted_bytes: usize, text: &str) {
        if deleted_bytes > 0 {
            self.handle_deletion(offset, deleted_bytes);
        }
        if !text.is_empty() {
            self.handle_insertion(offset, text);
        }
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLines for LineIndex {
    fn length(&self) -> usize {
        self.length
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_of_offset(&self, offset: usize) -> Option<usize> {
        if offset > self.length {
            return None;
        }
        Some(self.line_starts.partition_point(|&s| s <= offset) - 1)
    }

    fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    fn line_end(&self, line: usize) -> Option<usize> {
        if line >= self.line_starts.len() {
            return None;
        }
        Some(
            self.line_starts
                .get(line + 1)
                .copied()
                .unwrap_or(self.length),
        )
    }
}
