//! Compiles inline authorization directives in templates.
//!
//! ```text
//! @allows('edit-post', $post) ... @endallows
//! @denies('publish') ... @enddenies
//! ```
//!
//! Each block becomes a conditional that calls the enforcer's `allows` or
//! `denies` method, in the syntax of the configured [`config::Dialect`].

pub mod compiler;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod rewriter;

pub use compiler::{Compiler, Extension, TemplateCompiler};
pub use config::{Config, Dialect, NestingPolicy, Preset};
pub use error::{CompileError, RewriteError};
pub use rewriter::{Rewriter, Rewritten};
