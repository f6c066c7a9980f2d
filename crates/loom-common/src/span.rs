use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// Every position inside the engine is a byte offset into the document text.
/// Line/character information is computed on demand via [`LineIndex`] when a
/// result crosses the LSP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `offset` falls inside the half-open span.
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Pre-computed index of line start positions.
///
/// Built once per document version. Converts byte offsets to LSP positions
/// (zero-based line, UTF-16 character) and back, and to 1-based line/column
/// pairs for terminal diagnostics.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
    text: String,
}

impl LineIndex {
    /// Build a line index by scanning the source text for newline characters.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            text: source.to_string(),
        }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    ///
    /// Column is measured in bytes from the start of the line (1-based).
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = self.line_of(offset);
        let line = (line_idx as u32) + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Return the number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Total length of the indexed text in bytes.
    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Convert a byte offset to an LSP position.
    ///
    /// Offsets past the end of the text clamp to the end. Offsets inside a
    /// multi-byte character count the UTF-16 units before that character.
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len());
        let line_idx = self.line_of(offset);
        let start = self.line_starts[line_idx] as usize;
        let mut character = 0u32;
        for (i, ch) in self.text[start..].char_indices() {
            if start + i >= offset as usize {
                break;
            }
            character += ch.len_utf16() as u32;
        }
        Position::new(line_idx as u32, character)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns `None` when the line does not exist or the character lies past
    /// the end of the line. The end-of-line position itself is valid.
    pub fn offset(&self, position: Position) -> Option<u32> {
        let line_idx = position.line as usize;
        let start = *self.line_starts.get(line_idx)? as usize;
        let end = match self.line_starts.get(line_idx + 1) {
            Some(&next) => next as usize - 1,
            None => self.text.len(),
        };
        let line = &self.text[start..end];
        let line = line.strip_suffix('\r').unwrap_or(line);

        let mut units = 0u32;
        for (i, ch) in line.char_indices() {
            if units == position.character {
                return Some((start + i) as u32);
            }
            units += ch.len_utf16() as u32;
            if units > position.character {
                // Position points into the middle of a surrogate pair.
                return None;
            }
        }
        if units == position.character {
            Some((start + line.len()) as u32)
        } else {
            None
        }
    }

    fn line_of(&self, offset: u32) -> usize {
        // partition_point returns the index of the first line_start > offset,
        // so the line index is one less than that.
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }
}
