pub mod arguments;
pub mod scanner;

pub use arguments::Arguments;
pub use scanner::{DirectiveKind, DirectiveScanner, EndDirective, Marker, OpenDirective};

use serde::{Deserialize, Serialize};

/// A 1-based line and column inside a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of a source string to line/column positions
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, line_starts }
    }

    /// Position of the character starting at `offset`.
    /// Columns count characters, not bytes.
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self.source[start..offset].chars().count() + 1;
        Position::new(line + 1, column)
    }
}

/// Tracks whether the scanner is inside a quoted string literal
#[derive(Debug, Default)]
pub(crate) struct QuoteState {
    quote: Option<char>,
    escaped: bool,
}

impl QuoteState {
    /// Feed one character; returns true when it belongs to a string literal
    /// (including the opening and closing quotes).
    pub(crate) fn feed(&mut self, ch: char) -> bool {
        match self.quote {
            Some(quote) => {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == quote {
                    self.quote = None;
                }
                true
            }
            None if ch == '\'' || ch == '"' => {
                self.quote = Some(ch);
                true
            }
            None => false,
        }
    }
}
