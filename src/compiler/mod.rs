pub mod diagnostic;
pub mod engine;

pub use diagnostic::{Diagnostic, Level};
pub use engine::{FileReport, TemplateCompiler};

use crate::error::{CompileError, RewriteError};
use crate::rewriter::{Rewriter, Rewritten};
use tracing::trace;

/// A template-compilation hook: takes template text, returns transformed text
pub trait Extension: Send + Sync {
    /// Unique identifier, used when reporting failures
    fn id(&self) -> &str;

    /// Transform one template
    fn apply(&self, source: &str) -> Result<Rewritten, RewriteError>;
}

/// The built-in `@allows`/`@denies` extension
pub struct AuthorizationDirectives {
    rewriter: Rewriter,
}

impl AuthorizationDirectives {
    pub const ID: &'static str = "authorization";

    pub fn new(rewriter: Rewriter) -> Self {
        Self { rewriter }
    }
}

impl Extension for AuthorizationDirectives {
    fn id(&self) -> &str {
        Self::ID
    }

    fn apply(&self, source: &str) -> Result<Rewritten, RewriteError> {
        self.rewriter.rewrite(source)
    }
}

/// Adapts an infallible `Fn(&str) -> String` closure into an extension
pub struct FnExtension<F> {
    id: String,
    transform: F,
}

impl<F> Extension for FnExtension<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, source: &str) -> Result<Rewritten, RewriteError> {
        Ok(Rewritten::unchanged((self.transform)(source)))
    }
}

/// Ordered registry of extensions run over each template
#[derive(Default)]
pub struct Compiler {
    extensions: Vec<Box<dyn Extension>>,
}

impl Compiler {
    /// Create an empty compiler
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with the authorization extension registered
    pub fn with_rewriter(rewriter: Rewriter) -> Self {
        let mut compiler = Self::new();
        compiler.register(Box::new(AuthorizationDirectives::new(rewriter)));
        compiler
    }

    /// Register an extension; extensions run in registration order
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        self.extensions.push(extension);
    }

    /// Register a plain closure as an extension
    pub fn extend<F>(&mut self, id: impl Into<String>, transform: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.register(Box::new(FnExtension {
            id: id.into(),
            transform,
        }));
    }

    /// Get all registered extension IDs, in order
    pub fn extension_ids(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.id()).collect()
    }

    /// Run every extension over the template, feeding each the previous output
    pub fn compile(&self, source: &str) -> Result<Rewritten, CompileError> {
        let mut text = source.to_string();
        let mut warnings = Vec::new();

        for extension in &self.extensions {
            trace!(extension = extension.id(), "applying extension");
            let output = extension.apply(&text).map_err(|source| CompileError {
                extension: extension.id().to_string(),
                source,
            })?;
            text = output.text;
            warnings.extend(output.warnings);
        }

        Ok(Rewritten { text, warnings })
    }
}
