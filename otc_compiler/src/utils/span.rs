//! Byte-range locations inside a chain string
//!
//! Chains are single-line expressions, so a location is a half-open byte
//! range. Columns reported to users are 1-based.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open byte range `[start, end)` within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    /// Single-byte span at `offset`
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset + 1,
        }
    }

    /// 1-based column of the first byte
    pub fn column(&self) -> usize {
        self.start + 1
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Text covered by this span, or `None` when out of range or not on a
    /// character boundary
    pub fn slice<'a>(&self, input: &'a str) -> Option<&'a str> {
        input.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() <= 1 {
            write!(f, "col {}", self.column())
        } else {
            write!(f, "cols {}-{}", self.column(), self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_and_column() {
        let chain = "orders[*].items";
        let span = Span::new(10, 15);
        assert_eq!(span.slice(chain), Some("items"));
        assert_eq!(span.column(), 11);
        assert_eq!(Span::new(3, 99).slice(chain), None);
    }

    #[test]
    fn test_merge_and_display() {
        let merged = Span::at(2).merge(Span::new(5, 8));
        assert_eq!(merged, Span::new(2, 8));
        assert_eq!(Span::at(0).to_string(), "col 1");
        assert_eq!(merged.to_string(), "cols 3-8");
    }
}
