//! Source positions for tokens and parse errors.

/// A byte range in the filter text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates an empty span at `pos`.
    #[must_use]
    pub const fn point(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span covers nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the smallest span covering both.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shifts the span by `offset` bytes, used when a sub-expression is
    /// compiled out of a larger input.
    #[must_use]
    pub const fn shift(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_is_empty() {
        assert!(Span::point(4).is_empty());
        assert_eq!(Span::new(2, 9).len(), 7);
    }

    #[test]
    fn test_to_covers_both() {
        let merged = Span::new(8, 15).to(Span::new(5, 10));
        assert_eq!(merged, Span::new(5, 15));
    }

    #[test]
    fn test_shift() {
        assert_eq!(Span::new(1, 3).shift(10), Span::new(11, 13));
    }
}
