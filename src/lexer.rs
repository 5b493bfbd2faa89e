//! Annotation lexer
//!
//! Reduces raw source text to a token stream of type-body boundaries and
//! annotation comment lines. The lexer never parses general-purpose syntax:
//! it tracks brace depth to tell nested type bodies apart from code blocks,
//! and recognizes single-line comments carrying the annotation sigil. All
//! other content is opaque.

use crate::token::Token;
use crate::{Error, Result};

/// Default annotation sigil: lines of the form `// weft: ...`
pub const DEFAULT_SIGIL: &str = "weft";

/// Keywords opening a nominal-type body in the host source
const TYPE_KEYWORDS: &[&str] = &["class", "struct", "enum"];

/// Lexer over one source file.
pub struct Lexer<'a> {
    source: &'a str,
    file: &'a str,
    sigil: String,
}

impl<'a> Lexer<'a> {
    /// Create a lexer with the default sigil
    pub fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source,
            file,
            sigil: DEFAULT_SIGIL.to_string(),
        }
    }

    /// Override the annotation sigil (the word before the colon)
    pub fn with_sigil(mut self, sigil: impl Into<String>) -> Self {
        self.sigil = sigil.into();
        self
    }

    /// Tokenize the source into type boundaries and annotation lines.
    ///
    /// Fails with [`Error::Lex`] when a comment line carries the sigil but
    /// violates the annotation line shape, or when type bodies are left
    /// unterminated at end of input.
    pub fn tokenize(&self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut depth: i64 = 0;
        // Depths at which currently-open type bodies started
        let mut open_types: Vec<i64> = Vec::new();
        // Type name seen after a keyword, waiting for its opening brace
        let mut pending_type: Option<String> = None;
        let mut last_line = 0u32;

        for (idx, raw_line) in self.source.lines().enumerate() {
            let line = idx as u32 + 1;
            last_line = line;

            let trimmed = raw_line.trim_start();
            if let Some(comment) = trimmed.strip_prefix("//") {
                self.lex_comment(comment, line, &mut tokens)?;
                continue;
            }

            self.lex_code(
                raw_line,
                line,
                &mut depth,
                &mut open_types,
                &mut pending_type,
                &mut tokens,
            )?;
        }

        if !open_types.is_empty() || depth != 0 {
            return Err(Error::Lex {
                file: self.file.to_string(),
                line: last_line,
                reason: "unterminated type body at end of file".to_string(),
            });
        }

        Ok(tokens)
    }

    /// Lex a single-line comment body (text after `//`).
    fn lex_comment(&self, comment: &str, line: u32, tokens: &mut Vec<Token>) -> Result<()> {
        let body = comment.trim_start();
        let prefix = format!("{}:", self.sigil);

        if let Some(payload) = body.strip_prefix(prefix.as_str()) {
            let payload = payload.trim();
            if payload.is_empty() {
                return Err(Error::Lex {
                    file: self.file.to_string(),
                    line,
                    reason: "empty annotation".to_string(),
                });
            }
            tokens.push(Token::annotation(payload, line));
            return Ok(());
        }

        // Sigil word present but the colon is missing: almost certainly a
        // mistyped annotation, reject it rather than silently skipping.
        if body == self.sigil
            || body
                .strip_prefix(self.sigil.as_str())
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        {
            return Err(Error::Lex {
                file: self.file.to_string(),
                line,
                reason: format!("annotation comment must start with '// {}:'", self.sigil),
            });
        }

        Ok(())
    }

    /// Lex a non-comment line: track braces and type-declaration headers.
    fn lex_code(
        &self,
        raw_line: &str,
        line: u32,
        depth: &mut i64,
        open_types: &mut Vec<i64>,
        pending_type: &mut Option<String>,
        tokens: &mut Vec<Token>,
    ) -> Result<()> {
        let mut chars = raw_line.chars().peekable();
        let mut in_string = false;
        let mut expect_name = false;

        while let Some(c) = chars.next() {
            if in_string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match c {
                '"' => in_string = true,
                // Trailing comment: the rest of the line is commentary, but
                // only outside a string literal
                '/' if chars.peek() == Some(&'/') => break,
                '{' => {
                    if let Some(name) = pending_type.take() {
                        tokens.push(Token::type_open(name, line));
                        open_types.push(*depth);
                    }
                    *depth += 1;
                    expect_name = false;
                }
                '}' => {
                    *depth -= 1;
                    if *depth < 0 {
                        return Err(Error::Lex {
                            file: self.file.to_string(),
                            line,
                            reason: "unbalanced closing brace".to_string(),
                        });
                    }
                    if open_types.last() == Some(depth) {
                        open_types.pop();
                        tokens.push(Token::type_close(line));
                    }
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut word = String::new();
                    word.push(c);
                    while let Some(&n) = chars.peek() {
                        if n.is_alphanumeric() || n == '_' {
                            word.push(n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if expect_name {
                        *pending_type = Some(word);
                        expect_name = false;
                    } else if TYPE_KEYWORDS.contains(&word.as_str()) {
                        expect_name = true;
                    }
                }
                ';' => {
                    // Statement end discards an unopened type header
                    *pending_type = None;
                }
                _ => {}
            }
        }

        Ok(())
    }
}
