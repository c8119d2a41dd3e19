use crate::config::{Dialect, NestingPolicy};
use crate::error::{Result, RewriteError};
use crate::parser::{DirectiveKind, DirectiveScanner, Marker, Position};
use tracing::{debug, warn};

/// Non-fatal finding produced while rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteWarning {
    pub kind: DirectiveKind,
    /// The nested directive
    pub position: Position,
    /// The enclosing directive of the same type
    pub outer: Position,
}

impl RewriteWarning {
    pub fn code(&self) -> &'static str {
        "nested-directive"
    }

    pub fn message(&self) -> String {
        format!("@{} is nested inside @{} opened at {}", self.kind, self.kind, self.outer)
    }
}

/// Output of a rewrite pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub warnings: Vec<RewriteWarning>,
}

impl Rewritten {
    /// Wrap text that needed no changes
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warnings: Vec::new(),
        }
    }
}

/// Rewrites `@allows`/`@denies` blocks into dialect conditionals
pub struct Rewriter {
    scanner: DirectiveScanner,
    dialect: Dialect,
    nesting: NestingPolicy,
}

impl Rewriter {
    /// Create a rewriter with the default nesting policy
    pub fn new(dialect: Dialect) -> Self {
        Self::with_nesting(dialect, NestingPolicy::default())
    }

    pub fn with_nesting(dialect: Dialect, nesting: NestingPolicy) -> Self {
        Self {
            scanner: DirectiveScanner::new(),
            dialect,
            nesting,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn nesting(&self) -> NestingPolicy {
        self.nesting
    }

    /// Rewrite one template.
    ///
    /// Text without directive markers is returned unchanged. Otherwise the
    /// preamble is prepended once and each marker is replaced in place.
    pub fn rewrite(&self, source: &str) -> Result<Rewritten> {
        let markers = self.scanner.scan(source)?;
        if markers.is_empty() {
            return Ok(Rewritten::unchanged(source));
        }

        let mut text = String::with_capacity(source.len() + self.dialect.preamble.len() + markers.len() * 48);
        text.push_str(&self.dialect.preamble);

        let mut open: Vec<(DirectiveKind, Position)> = Vec::new();
        let mut warnings = Vec::new();
        let mut cursor = 0;

        for marker in &markers {
            let span = marker.span();
            text.push_str(&source[cursor..span.start]);

            match marker {
                Marker::Open(directive) => {
                    let arguments = directive.arguments()?;

                    let enclosing = open.iter().rev().find(|(kind, _)| *kind == directive.kind);
                    if let Some(&(_, outer)) = enclosing {
                        match self.nesting {
                            NestingPolicy::Allow => {}
                            NestingPolicy::Warn => {
                                let warning = RewriteWarning {
                                    kind: directive.kind,
                                    position: directive.position,
                                    outer,
                                };
                                warn!(position = %directive.position, "{}", warning.message());
                                warnings.push(warning);
                            }
                            NestingPolicy::Deny => {
                                return Err(RewriteError::Nested {
                                    kind: directive.kind,
                                    outer,
                                    position: directive.position,
                                });
                            }
                        }
                    }

                    open.push((directive.kind, directive.position));
                    text.push_str(&self.dialect.render_open(directive.kind, &arguments));
                }
                Marker::End(end) => {
                    let Some((kind, opened)) = open.pop() else {
                        return Err(RewriteError::UnexpectedEnd {
                            kind: end.kind,
                            position: end.position,
                        });
                    };

                    if kind != end.kind {
                        return Err(RewriteError::MismatchedEnd {
                            expected: kind,
                            found: end.kind,
                            opened,
                            position: end.position,
                        });
                    }

                    text.push_str(&self.dialect.close);
                }
            }

            cursor = span.end;
        }

        if let Some((kind, position)) = open.pop() {
            return Err(RewriteError::Unclosed { kind, position });
        }

        text.push_str(&source[cursor..]);
        debug!(markers = markers.len(), warnings = warnings.len(), "rewrote directives");

        Ok(Rewritten { text, warnings })
    }
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}
