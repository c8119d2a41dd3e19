pub mod human;
pub mod json;

use crate::compiler::{FileReport, Level};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON format for machine processing
    Json,
}

/// Trait for formatting compilation results
pub trait OutputFormatter {
    /// Format the file reports for output
    fn format_results(&self, results: &[FileReport]) -> String;
}

/// Get the appropriate formatter for the given format
pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human => Box::new(human::HumanFormatter::new()),
        OutputFormat::Json => Box::new(json::JsonFormatter::new()),
    }
}

/// Statistics about a compilation run
#[derive(Debug, Default)]
pub struct CompileStats {
    pub total_files: usize,
    pub files_changed: usize,
    pub files_with_problems: usize,
    pub total_problems: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl CompileStats {
    /// Calculate statistics from file reports
    pub fn from_results(results: &[FileReport]) -> Self {
        let mut stats = Self {
            total_files: results.len(),
            files_changed: results.iter().filter(|r| r.changed).count(),
            files_with_problems: results.iter().filter(|r| !r.diagnostics.is_empty()).count(),
            ..Self::default()
        };

        for report in results {
            stats.total_problems += report.diagnostics.len();

            for diagnostic in &report.diagnostics {
                match diagnostic.level {
                    Level::Error => stats.errors += 1,
                    Level::Warning => stats.warnings += 1,
                }
            }
        }

        stats
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Check if there are any problems
    pub fn has_problems(&self) -> bool {
        self.total_problems > 0
    }
}

#[cfg(test)]
pub(crate) fn report(path: &str, output: Option<&str>, diagnostics: Vec<crate::compiler::Diagnostic>) -> FileReport {
    FileReport {
        path: path.into(),
        relative_path: path.into(),
        output: output.map(str::to_string),
        changed: output.is_some_and(|text| text.contains("enforcer")),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Diagnostic;

    #[test]
    fn test_compile_stats_empty() {
        let stats = CompileStats::from_results(&[]);

        assert_eq!(stats.total_files, 0);
        assert_eq!(stats.files_changed, 0);
        assert_eq!(stats.files_with_problems, 0);
        assert_eq!(stats.total_problems, 0);
        assert!(!stats.has_errors());
        assert!(!stats.has_problems());
    }

    #[test]
    fn test_compile_stats_with_problems() {
        let results = vec![
            report(
                "a.blade.php",
                None,
                vec![Diagnostic::new(1, 1, Level::Error, "unexpected-end", "error message")],
            ),
            report("b.blade.php", Some("plain"), vec![]),
            report(
                "c.blade.php",
                Some("$enforcer"),
                vec![Diagnostic::new(2, 1, Level::Warning, "nested-directive", "warning message")],
            ),
        ];

        let stats = CompileStats::from_results(&results);

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.files_changed, 1);
        assert_eq!(stats.files_with_problems, 2);
        assert_eq!(stats.total_problems, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.warnings, 1);
        assert!(stats.has_errors());
        assert!(stats.has_problems());
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Human);
    }
}
