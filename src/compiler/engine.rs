use super::{Compiler, Diagnostic};
use crate::config::Config;
use crate::rewriter::Rewriter;
use eyre::{Context, Result};
use rayon::prelude::*;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Result of compiling one template file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path the template was read from
    pub path: PathBuf,
    /// Path relative to the argument it was found under; used to mirror trees
    pub relative_path: PathBuf,
    /// Compiled text, absent when compilation failed
    pub output: Option<String>,
    /// Whether the compiled text differs from the source
    pub changed: bool,
    /// Problems found, sorted by position
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compiles template files with a configured extension chain
pub struct TemplateCompiler {
    compiler: Compiler,
    config: Config,
}

impl TemplateCompiler {
    /// Create a compiler for the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let dialect = config.resolve_dialect()?;
        let rewriter = Rewriter::with_nesting(dialect, config.nesting());

        Ok(Self::with_compiler(Compiler::with_rewriter(rewriter), config))
    }

    /// Use a custom extension chain
    pub fn with_compiler(compiler: Compiler, config: Config) -> Self {
        Self { compiler, config }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Compile a single file; explicitly named files are compiled regardless of patterns
    pub fn compile_file<P: AsRef<Path>>(&self, file_path: P) -> Result<FileReport> {
        let file_path = file_path.as_ref();
        self.compile_file_at(file_path, output_relative_path(file_path))
    }

    fn compile_file_at(&self, file_path: &Path, relative_path: PathBuf) -> Result<FileReport> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read file {}", file_path.display()))?;

        let mut report = self.compile_content(file_path, &content);
        report.relative_path = relative_path;
        Ok(report)
    }

    /// Compile template text with a given file path context
    pub fn compile_content<P: AsRef<Path>>(&self, file_path: P, content: &str) -> FileReport {
        let file_path = file_path.as_ref();

        let (output, mut diagnostics) = match self.compiler.compile(content) {
            Ok(rewritten) => {
                let diagnostics = rewritten.warnings.iter().map(Diagnostic::from).collect();
                (Some(rewritten.text), diagnostics)
            }
            Err(err) => {
                debug!(path = %file_path.display(), error = %err, "template failed to compile");
                (None, vec![Diagnostic::from(&err.source)])
            }
        };
        diagnostics.sort();
        let changed = output.as_deref().is_some_and(|text| text != content);

        FileReport {
            path: file_path.to_path_buf(),
            relative_path: file_path.to_path_buf(),
            output,
            changed,
            diagnostics,
        }
    }

    /// Compile multiple files or directories
    pub fn compile_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<FileReport>> {
        let mut targets = Vec::new();

        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                targets.push((path.to_path_buf(), output_relative_path(path)));
            } else if path.is_dir() {
                for entry in WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                {
                    let file_path = entry.path();

                    if self.config.is_file_ignored(file_path) || !self.config.is_template_file(file_path) {
                        continue;
                    }

                    let relative = file_path.strip_prefix(path).unwrap_or(file_path).to_path_buf();
                    targets.push((file_path.to_path_buf(), relative));
                }
            } else {
                return Err(eyre::eyre!("Path does not exist: {}", path.display()));
            }
        }

        info!(files = targets.len(), "compiling templates");
        self.compile_files_parallel(&targets)
    }

    /// Compile files in parallel, keeping input order
    fn compile_files_parallel(&self, targets: &[(PathBuf, PathBuf)]) -> Result<Vec<FileReport>> {
        targets
            .par_iter()
            .map(|(file_path, relative)| self.compile_file_at(file_path, relative.clone()))
            .collect()
    }
}

/// Path of an explicitly named file as it should appear under an output directory.
/// Keeps the path as given, minus any root, prefix, `.` or `..` components.
fn output_relative_path(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
