use super::{CompileStats, OutputFormatter};
use crate::compiler::{Diagnostic, FileReport};
use serde::{Deserialize, Serialize};

/// JSON output formatter
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonOutput {
    stats: JsonStats,
    files: Vec<JsonFileResult>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonStats {
    total_files: usize,
    files_changed: usize,
    files_with_problems: usize,
    total_problems: usize,
    errors: usize,
    warnings: usize,
}

impl From<&CompileStats> for JsonStats {
    fn from(stats: &CompileStats) -> Self {
        Self {
            total_files: stats.total_files,
            files_changed: stats.files_changed,
            files_with_problems: stats.files_with_problems,
            total_problems: stats.total_problems,
            errors: stats.errors,
            warnings: stats.warnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonFileResult {
    path: String,
    /// False when the template failed to compile
    compiled: bool,
    changed: bool,
    diagnostics: Vec<Diagnostic>,
}

impl From<&FileReport> for JsonFileResult {
    fn from(report: &FileReport) -> Self {
        Self {
            path: report.path.display().to_string(),
            compiled: report.output.is_some(),
            changed: report.changed,
            diagnostics: report.diagnostics.clone(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_results(&self, results: &[FileReport]) -> String {
        let stats = CompileStats::from_results(results);

        let json_output = JsonOutput {
            stats: JsonStats::from(&stats),
            files: results.iter().map(JsonFileResult::from).collect(),
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize JSON: {e}"}}"#))
    }
}
