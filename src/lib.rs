//! # Weft - annotation-driven dependency injection code generator
//!
//! Weft scans annotated source files, extracts declarative dependency
//! injection directives embedded in comments, builds a cross-file dependency
//! graph scoped by nominal-type nesting, validates it for resolvability and
//! safe cyclicity, and emits one container/resolver unit per annotated type.
//!
//! The pipeline runs left to right:
//! - [`lexer`]: raw text → token stream of type boundaries and annotations
//! - [`parser`]: token stream → per-file tree of nested type declarations
//! - [`inspector`]: merged forest → validated dependency graph, or a diagnostic
//! - [`generator`]: validated forest + template → rendered text per type
//!
//! [`batch`] wires the stages together for an ordered collection of files,
//! running lex/parse in parallel and the inspector as a global barrier.

pub mod ast;
pub mod batch;
pub mod config;
pub mod generator;
pub mod inspector;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod ui;

// Re-exports for convenient access
pub use ast::{DependencyDeclaration, Scope, TypeDeclaration, TypeRef};
pub use batch::{BatchOptions, SourceFile};
pub use generator::GeneratedUnit;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

/// Result type alias for Weft operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Weft operations.
///
/// Parsing errors are terminal for the affected file; inspector errors abort
/// the whole batch because the graph is global. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{file}:{line}: invalid annotation: {reason}")]
    Lex {
        file: String,
        line: u32,
        reason: String,
    },

    #[error("{file}:{line}: parse error: {reason}")]
    Parse {
        file: String,
        line: u32,
        reason: String,
    },

    #[error("{file}:{line}: unresolvable dependency '{name}: {type_name}': no ancestor registration matches")]
    UnresolvableDependency {
        file: String,
        line: u32,
        name: String,
        type_name: String,
    },

    #[error("{file}:{line}: cyclic dependency closed by '{name}: {type_name}': the cycle has no weak edge")]
    CyclicDependency {
        file: String,
        line: u32,
        name: String,
        type_name: String,
    },

    #[error("unknown scope '{0}', expected transient, graph, container or weak")]
    UnknownScope(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Error::Lex { .. } => "lex",
            Error::Parse { .. } => "parse",
            Error::UnresolvableDependency { .. } => "unresolvable-dependency",
            Error::CyclicDependency { .. } => "cyclic-dependency",
            Error::UnknownScope(_) => "unknown-scope",
            Error::Template(_) => "template",
            Error::Render(_) => "render",
            Error::Io(_) => "io",
        }
    }
}
