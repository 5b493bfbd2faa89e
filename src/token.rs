//! Lexical tokens produced by the annotation lexer
//!
//! The lexer reduces arbitrary source text to three token kinds:
//! - `TypeOpen`: a nominal-type body opened (`class Foo {`)
//! - `TypeClose`: the matching body closed
//! - `Annotation`: a sigil-prefixed comment line, payload passed through verbatim
//!
//! Everything else in the source is opaque and produces no token.

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A nominal-type declaration body opened. Carries the type name.
    TypeOpen { name: String },
    /// The body of the innermost open type closed.
    TypeClose,
    /// An annotation comment line. Carries the raw payload after the sigil.
    Annotation { body: String },
}

/// A lexical token with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Line number (1-indexed) where the token appears.
    pub line: u32,
}

impl Token {
    /// Create a type-open token
    pub fn type_open(name: impl Into<String>, line: u32) -> Self {
        Self {
            kind: TokenKind::TypeOpen { name: name.into() },
            line,
        }
    }

    /// Create a type-close token
    pub fn type_close(line: u32) -> Self {
        Self {
            kind: TokenKind::TypeClose,
            line,
        }
    }

    /// Create an annotation token from the raw payload after the sigil
    pub fn annotation(body: impl Into<String>, line: u32) -> Self {
        Self {
            kind: TokenKind::Annotation { body: body.into() },
            line,
        }
    }
}
