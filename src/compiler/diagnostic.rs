use crate::error::RewriteError;
use crate::rewriter::RewriteWarning;
use serde::{Deserialize, Serialize};

/// Represents the severity level of a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Template compiled, but something deserves a look
    Warning,
    /// Template could not be compiled
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// Every code a diagnostic can carry, with a short description
pub const CODES: &[(&str, &str)] = &[
    ("unterminated-directive", "An @allows/@denies opener has no balancing closing parenthesis"),
    ("empty-policy", "A directive has no policy expression"),
    ("empty-argument", "A directive's argument list contains an empty entry"),
    ("unexpected-end", "An @endallows/@enddenies marker has no open directive"),
    ("mismatched-end", "An end marker closes a directive of the other type"),
    ("unclosed-directive", "A directive is still open at the end of the template"),
    ("nested-directive", "A directive is nested inside another of the same type"),
];

/// A problem found in a template, located by line and column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    pub level: Level,
    /// Stable code, see [`CODES`]
    pub code: String,
    pub message: String,
    /// Optional suggestion for fixing the problem
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        line: usize,
        column: usize,
        level: Level,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            level,
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Get a formatted message including the code
    pub fn formatted_message(&self) -> String {
        format!("{} ({})", self.message, self.code)
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl From<&RewriteError> for Diagnostic {
    fn from(err: &RewriteError) -> Self {
        let position = err.position();
        let diagnostic = Self::new(position.line, position.column, Level::Error, err.code(), err.to_string());
        match err.suggestion() {
            Some(suggestion) => diagnostic.with_suggestion(suggestion),
            None => diagnostic,
        }
    }
}

impl From<&RewriteWarning> for Diagnostic {
    fn from(warning: &RewriteWarning) -> Self {
        Self::new(
            warning.position.line,
            warning.position.column,
            Level::Warning,
            warning.code(),
            warning.message(),
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.formatted_message())
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
            .then_with(|| self.level.cmp(&other.level))
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.suggestion.cmp(&other.suggestion))
    }
}
