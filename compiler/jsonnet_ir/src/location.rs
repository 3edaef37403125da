//! Source locations for error traces.
//!
//! Positions are 1-based line/column pairs; a zero line marks an unset
//! position. Ranges carry an optional file name so synthetic ranges (builtin
//! frames, manifestation) can render as a bare message.

use std::fmt;
use std::sync::Arc;

/// 1-based position in a source file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }

    /// Whether this position refers to an actual source point.
    #[inline]
    pub const fn is_set(self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Range between two positions in one file.
///
/// A range with an unset `begin` renders as just the file text; this is how
/// synthetic frames such as `<builtin>` appear in traces.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LocationRange {
    pub file: Option<Arc<str>>,
    pub begin: Location,
    pub end: Location,
}

impl LocationRange {
    pub fn new(file: impl Into<Arc<str>>, begin: Location, end: Location) -> Self {
        LocationRange {
            file: Some(file.into()),
            begin,
            end,
        }
    }

    /// Range with positions but no file name (anonymous snippets).
    pub fn bare(begin: Location, end: Location) -> Self {
        LocationRange {
            file: None,
            begin,
            end,
        }
    }

    /// Synthetic range that renders as a bare message, e.g. `<builtin>`.
    pub fn message(text: &str) -> Self {
        LocationRange {
            file: Some(text.into()),
            begin: Location::default(),
            end: Location::default(),
        }
    }

    /// Whether the range refers to actual source positions.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.begin.is_set()
    }
}

impl fmt::Display for LocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("");
        if !self.is_set() {
            return write!(f, "{file}");
        }
        let sep = if file.is_empty() { "" } else { ":" };
        if self.begin.line == self.end.line {
            if self.begin.column == self.end.column {
                write!(f, "{file}{sep}{}", self.begin)
            } else {
                write!(f, "{file}{sep}{}-{}", self.begin, self.end.column)
            }
        } else {
            write!(f, "{file}{sep}({})-({})", self.begin, self.end)
        }
    }
}
