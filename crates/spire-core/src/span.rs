//! Positions in schedule files and shader sources.
//!
//! A [`Span`] is a line/column/length triple. Symbols built in code rather
//! than parsed carry [`Span::default`], which has line 0 and prints as `?`.
//! [`Location`] pairs a span with the file or shader it belongs to, which
//! is how diagnostics print their position.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// 1-based; 0 when the position is not known.
    pub line: u32,
    /// 1-based byte column.
    pub col: u32,
    pub len: u32,
}

impl Span {
    #[inline]
    pub const fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Extend this span to the end of `end`.
    ///
    /// Only a same-line `end` that starts at or after `self` extends it; a
    /// dotted choice name or `world:alt` broken across lines keeps the
    /// position of its first token.
    pub fn through(self, end: Span) -> Span {
        if end.line != self.line || end.col < self.col {
            return self;
        }
        Span {
            len: (end.col + end.len - self.col).max(self.len),
            ..self
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "?")
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

/// A span inside a named section: a schedule file or a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub section: Option<&'a str>,
    pub span: Span,
}

impl<'a> Location<'a> {
    pub fn new(section: Option<&'a str>, span: Span) -> Self {
        Self { section, span }
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Some(section) => write!(f, "{}:{}", section, self.span),
            None => write!(f, "{}", self.span),
        }
    }
}
