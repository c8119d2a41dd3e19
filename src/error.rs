//! Error types for directive rewriting

use crate::parser::{DirectiveKind, Position};
use thiserror::Error;

/// Malformed directive usage found while rewriting a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Opening directive without a balancing `)`
    #[error("@{kind} is missing its closing parenthesis")]
    Unterminated { kind: DirectiveKind, position: Position },

    /// Opening directive with no policy expression
    #[error("@{kind} has no policy expression")]
    EmptyPolicy { kind: DirectiveKind, position: Position },

    /// Empty entry in a complex argument list
    #[error("@{kind} has an empty argument at index {index}")]
    EmptyArgument {
        kind: DirectiveKind,
        index: usize,
        position: Position,
    },

    /// End marker with no open directive
    #[error("@end{kind} has no matching @{kind}")]
    UnexpectedEnd { kind: DirectiveKind, position: Position },

    /// End marker whose type differs from the innermost open directive
    #[error("@end{found} cannot close @{expected} opened at {opened}")]
    MismatchedEnd {
        expected: DirectiveKind,
        found: DirectiveKind,
        opened: Position,
        position: Position,
    },

    /// Directive still open at end of template
    #[error("@{kind} is never closed by @end{kind}")]
    Unclosed { kind: DirectiveKind, position: Position },

    /// Same-type nesting while nesting is denied
    #[error("@{kind} is nested inside @{kind} opened at {outer}")]
    Nested {
        kind: DirectiveKind,
        outer: Position,
        position: Position,
    },
}

impl RewriteError {
    /// Location of the offending marker
    pub fn position(&self) -> Position {
        match self {
            RewriteError::Unterminated { position, .. }
            | RewriteError::EmptyPolicy { position, .. }
            | RewriteError::EmptyArgument { position, .. }
            | RewriteError::UnexpectedEnd { position, .. }
            | RewriteError::MismatchedEnd { position, .. }
            | RewriteError::Unclosed { position, .. }
            | RewriteError::Nested { position, .. } => *position,
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            RewriteError::Unterminated { .. } => "unterminated-directive",
            RewriteError::EmptyPolicy { .. } => "empty-policy",
            RewriteError::EmptyArgument { .. } => "empty-argument",
            RewriteError::UnexpectedEnd { .. } => "unexpected-end",
            RewriteError::MismatchedEnd { .. } => "mismatched-end",
            RewriteError::Unclosed { .. } => "unclosed-directive",
            RewriteError::Nested { .. } => "nested-directive",
        }
    }

    /// A hint for fixing the template, where one is obvious
    pub fn suggestion(&self) -> Option<String> {
        match self {
            RewriteError::Unclosed { kind, .. } => Some(format!("Add @end{kind} after the guarded block")),
            RewriteError::MismatchedEnd { expected, .. } => {
                Some(format!("Close the inner block with @end{expected}"))
            }
            RewriteError::Unterminated { .. } => {
                Some("Check for unbalanced parentheses or an unclosed string literal".to_string())
            }
            _ => None,
        }
    }
}

/// A registered extension failed on a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("extension '{extension}' failed at {position}: {source}", position = .source.position())]
pub struct CompileError {
    pub extension: String,
    #[source]
    pub source: RewriteError,
}

/// Result type for rewriting operations
pub type Result<T> = std::result::Result<T, RewriteError>;
