use super::{Arguments, LineIndex, Position, QuoteState};
use crate::error::{Result, RewriteError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::trace;

/// The two authorization directive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// `@allows(...)` / `@endallows`
    Allows,
    /// `@denies(...)` / `@enddenies`
    Denies,
}

impl DirectiveKind {
    /// Directive name, which is also the enforcer method it calls
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::Allows => "allows",
            DirectiveKind::Denies => "denies",
        }
    }

    fn from_marker(name: &str) -> Self {
        if name == "allows" {
            DirectiveKind::Allows
        } else {
            DirectiveKind::Denies
        }
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An opening `@allows(...)` or `@denies(...)` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDirective<'a> {
    pub kind: DirectiveKind,
    /// Raw text between the outer parentheses
    pub args: &'a str,
    /// Byte span of the whole directive, from `@` through the closing `)`
    pub span: Range<usize>,
    pub position: Position,
}

impl<'a> OpenDirective<'a> {
    /// Split and classify the directive's arguments
    pub fn arguments(&self) -> Result<Arguments<'a>> {
        Arguments::parse(self.args).map_err(|index| match index {
            0 => RewriteError::EmptyPolicy {
                kind: self.kind,
                position: self.position,
            },
            index => RewriteError::EmptyArgument {
                kind: self.kind,
                index,
                position: self.position,
            },
        })
    }
}

/// A closing `@endallows` or `@enddenies` marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndDirective {
    pub kind: DirectiveKind,
    pub span: Range<usize>,
    pub position: Position,
}

/// A directive marker found in template source, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker<'a> {
    Open(OpenDirective<'a>),
    End(EndDirective),
}

impl Marker<'_> {
    pub fn span(&self) -> Range<usize> {
        match self {
            Marker::Open(open) => open.span.clone(),
            Marker::End(end) => end.span.clone(),
        }
    }

    pub fn kind(&self) -> DirectiveKind {
        match self {
            Marker::Open(open) => open.kind,
            Marker::End(end) => end.kind,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Marker::Open(open) => open.position,
            Marker::End(end) => end.position,
        }
    }
}

/// Finds authorization directives in template source
pub struct DirectiveScanner {
    marker_regex: Regex,
}

impl DirectiveScanner {
    /// Create a new directive scanner
    pub fn new() -> Self {
        // Group 1 marks an `@@` escape, group 2 an opener, group 3 an end marker.
        // The end-marker boundary is ASCII: only `[A-Za-z0-9_]` continues a name.
        let marker_regex = Regex::new(r"@(@)?(?:(allows|denies)\(|end(allows|denies)(?-u:\b))")
            .expect("Invalid directive marker regex");

        Self { marker_regex }
    }

    /// Scan the source for directive markers, in source order
    pub fn scan<'a>(&self, source: &'a str) -> Result<Vec<Marker<'a>>> {
        let index = LineIndex::new(source);
        let mut markers = Vec::new();
        let mut cursor = 0;

        while let Some(captures) = self.marker_regex.captures_at(source, cursor) {
            let Some(whole) = captures.get(0) else { break };
            cursor = whole.end();

            if captures.get(1).is_some() {
                trace!(offset = whole.start(), "skipping escaped directive");
                // An escaped opener's arguments are literal text too
                if captures.get(2).is_some() {
                    if let Some(close) = find_closing_paren(source, whole.end()) {
                        cursor = close + 1;
                    }
                }
                continue;
            }

            let position = index.position(whole.start());

            if let Some(name) = captures.get(2) {
                let kind = DirectiveKind::from_marker(name.as_str());
                let close = find_closing_paren(source, whole.end())
                    .ok_or(RewriteError::Unterminated { kind, position })?;

                trace!(%kind, %position, "found directive");
                markers.push(Marker::Open(OpenDirective {
                    kind,
                    args: &source[whole.end()..close],
                    span: whole.start()..close + 1,
                    position,
                }));
                cursor = close + 1;
            } else if let Some(name) = captures.get(3) {
                let kind = DirectiveKind::from_marker(name.as_str());

                trace!(%kind, %position, "found end marker");
                markers.push(Marker::End(EndDirective {
                    kind,
                    span: whole.range(),
                    position,
                }));
            }
        }

        Ok(markers)
    }
}

impl Default for DirectiveScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the `)` that balances an already-consumed `(` before `start`
fn find_closing_paren(source: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quotes = QuoteState::default();

    for (offset, ch) in source[start..].char_indices() {
        if quotes.feed(ch) {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
