use super::{CompileStats, OutputFormatter};
use crate::compiler::{FileReport, Level};
use std::io::IsTerminal;
use std::path::Path;

/// Human-readable output formatter
#[derive(Debug, Default)]
pub struct HumanFormatter {
    use_colors: bool,
}

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self {
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a new human formatter with explicit color setting
    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn should_use_colors() -> bool {
        std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn format_level(&self, level: &Level) -> String {
        match level {
            Level::Error => self.paint("31", "error"),
            Level::Warning => self.paint("33", "warning"),
        }
    }

    fn format_path(&self, path: &Path) -> String {
        self.paint("1", &path.display().to_string())
    }

    fn format_position(&self, line: usize, column: usize) -> String {
        self.paint("36", &format!("{line}:{column}"))
    }

    fn format_code(&self, code: &str) -> String {
        self.paint("90", &format!("({code})"))
    }

    fn format_stats(&self, stats: &CompileStats) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let mut parts = Vec::new();

        if stats.errors > 0 {
            parts.push(self.paint("31", &format!("{} error{}", stats.errors, plural(stats.errors))));
        }

        if stats.warnings > 0 {
            parts.push(self.paint("33", &format!("{} warning{}", stats.warnings, plural(stats.warnings))));
        }

        if parts.is_empty() {
            self.paint(
                "32",
                &format!("No problems found in {} file{}", stats.total_files, plural(stats.total_files)),
            )
        } else {
            format!("Found {}", parts.join(", "))
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_results(&self, results: &[FileReport]) -> String {
        let mut output = Vec::new();
        let stats = CompileStats::from_results(results);

        for report in results {
            if report.diagnostics.is_empty() {
                continue;
            }

            output.push(self.format_path(&report.path));

            for diagnostic in &report.diagnostics {
                output.push(format!(
                    "  {}: {} {} {}",
                    self.format_position(diagnostic.line, diagnostic.column),
                    self.format_level(&diagnostic.level),
                    diagnostic.message,
                    self.format_code(&diagnostic.code)
                ));

                if let Some(suggestion) = &diagnostic.suggestion {
                    output.push(format!("    {} {}", self.paint("36", "Suggestion:"), suggestion));
                }
            }

            output.push(String::new());
        }

        output.push(self.format_stats(&stats));

        output.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Diagnostic;
    use crate::output::report;

    #[test]
    fn test_human_formatter_no_problems() {
        let formatter = HumanFormatter::with_colors(false);
        let results = vec![report("a.blade.php", Some("a"), vec![]), report("b.blade.php", Some("b"), vec![])];

        assert_eq!(formatter.format_results(&results), "No problems found in 2 files");
    }

    #[test]
    fn test_human_formatter_with_problems() {
        let formatter = HumanFormatter::with_colors(false);
        let results = vec![report(
            "views/post.blade.php",
            None,
            vec![
                Diagnostic::new(3, 5, Level::Error, "unclosed-directive", "@allows is never closed by @endallows")
                    .with_suggestion("Add @endallows after the guarded block"),
                Diagnostic::new(7, 1, Level::Warning, "nested-directive", "@allows is nested"),
            ],
        )];

        let output = formatter.format_results(&results);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "views/post.blade.php");
        assert_eq!(
            lines[1],
            "  3:5: error @allows is never closed by @endallows (unclosed-directive)"
        );
        assert_eq!(lines[2], "    Suggestion: Add @endallows after the guarded block");
        assert_eq!(lines[3], "  7:1: warning @allows is nested (nested-directive)");
        assert_eq!(lines[5], "Found 1 error, 1 warning");
    }

    #[test]
    fn test_format_level_with_colors() {
        let formatter = HumanFormatter::with_colors(true);

        assert_eq!(formatter.format_level(&Level::Error), "\x1b[31merror\x1b[0m");
        assert_eq!(formatter.format_level(&Level::Warning), "\x1b[33mwarning\x1b[0m");
    }

    #[test]
    fn test_format_position_and_code() {
        let formatter = HumanFormatter::with_colors(false);
        assert_eq!(formatter.format_position(10, 5), "10:5");
        assert_eq!(formatter.format_code("empty-policy"), "(empty-policy)");
    }

    #[test]
    fn test_format_stats_single_items() {
        let formatter = HumanFormatter::with_colors(false);
        let stats = CompileStats {
            total_files: 1,
            files_with_problems: 1,
            total_problems: 1,
            errors: 1,
            ..CompileStats::default()
        };

        assert_eq!(formatter.format_stats(&stats), "Found 1 error");
        assert_eq!(
            formatter.format_stats(&CompileStats { total_files: 1, ..CompileStats::default() }),
            "No problems found in 1 file"
        );
    }
}
