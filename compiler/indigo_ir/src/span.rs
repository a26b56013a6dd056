//! Source location spans.
//!
//! A [`Span`] is a compact pair of byte offsets into one source file. Blocks
//! and properties pair a span with the file it came from (an [`Origin`]) so
//! diagnostics stay accurate after `@using` flattening mixes blocks from
//! several files into one sequence.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Byte-offset span within a single source file.
///
/// Layout: 8 bytes total
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Dummy span for synthesized nodes (sprite mixins, shorthand collapses).
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create from a byte range, saturating at `u32::MAX`.
    ///
    /// Source files beyond 4 GiB would already have failed to parse, so the
    /// saturation only guards the arithmetic.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Span {
            start: u32::try_from(range.start).unwrap_or(u32::MAX),
            end: u32::try_from(range.end).unwrap_or(u32::MAX),
        }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A span tied to the file it belongs to.
///
/// The path is reference-counted: every block and property in a parsed file
/// shares one allocation, and cloning an `Origin` during tree rewrites is two
/// pointer copies.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Origin {
    pub file: Arc<PathBuf>,
    pub span: Span,
}

impl Origin {
    /// Origin for nodes the compiler synthesizes itself.
    pub fn synthetic() -> Self {
        Origin {
            file: Arc::new(PathBuf::new()),
            span: Span::DUMMY,
        }
    }

    pub fn new(file: Arc<PathBuf>, span: Span) -> Self {
        Origin { file, span }
    }

    /// Path of the originating file.
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Same file, different span.
    #[must_use]
    pub fn with_span(&self, span: Span) -> Self {
        Origin {
            file: Arc::clone(&self.file),
            span,
        }
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.file.display(), self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        let a = Span::new(4, 10);
        let b = Span::new(8, 20);
        assert_eq!(a.merge(b), Span::new(4, 20));
        assert_eq!(b.merge(a), Span::new(4, 20));
    }

    #[test]
    fn origin_with_span_keeps_file() {
        let origin = Origin::new(Arc::new(PathBuf::from("a.icss")), Span::new(0, 4));
        let moved = origin.with_span(Span::new(9, 12));
        assert_eq!(moved.path(), Path::new("a.icss"));
        assert_eq!(moved.span, Span::new(9, 12));
    }
}
