use serde::{Deserialize, Serialize};

/// A position in a document, as the LSP counts it: zero-based line and
/// zero-based UTF-16 code unit offset within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Whether `pos` lies inside the range, end inclusive.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_order_by_line_then_character() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
    }

    #[test]
    fn range_contains_is_end_inclusive() {
        let range = Range::new(Position::new(0, 4), Position::new(0, 5));
        assert!(range.contains(Position::new(0, 4)));
        assert!(range.contains(Position::new(0, 5)));
        assert!(!range.contains(Position::new(0, 6)));
    }
}
