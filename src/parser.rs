//! Annotation parser
//!
//! Builds the per-file tree of [`TypeDeclaration`] nodes from the token
//! stream, attaching each annotation line to the innermost open type. The
//! annotation payload itself is parsed by a small hand-written recursive
//! descent over a fixed grammar, so every malformed line fails with a
//! line-accurate [`Error::Parse`].
//!
//! Grammar of one annotation payload:
//!
//! ```text
//! declaration  := registration | reference | parameter
//! registration := name '=' type [ '<-' type-list ] [ '<=' type-list ]
//! reference    := name '<-' type-list
//! parameter    := name '<=' type
//! property     := name '.scope' '=' scope | name '.customRef' '=' bool
//! type         := identifier [ '?' ]
//! ```

use crate::ast::{
    DependencyDeclaration, Parameter, Reference, Registration, Scope, TypeDeclaration, TypeRef,
};
use crate::token::{Token, TokenKind};
use crate::{Error, Result};

/// Parser over one file's token stream.
pub struct Parser<'a> {
    tokens: &'a [Token],
    file: &'a str,
}

impl<'a> Parser<'a> {
    /// Create a parser for the given token stream
    pub fn new(tokens: &'a [Token], file: &'a str) -> Self {
        Self { tokens, file }
    }

    /// Parse the token stream into the file's type-declaration roots.
    ///
    /// Types with zero annotation lines are recorded as zero-declaration
    /// nodes so the generator can positively select "no output" for them.
    pub fn parse(&self) -> Result<Vec<TypeDeclaration>> {
        let mut roots = Vec::new();
        let mut stack: Vec<TypeDeclaration> = Vec::new();

        for token in self.tokens {
            match &token.kind {
                TokenKind::TypeOpen { name } => {
                    stack.push(TypeDeclaration::new(name.clone(), self.file, token.line));
                }
                TokenKind::TypeClose => {
                    let closed = stack.pop().ok_or_else(|| Error::Parse {
                        file: self.file.to_string(),
                        line: token.line,
                        reason: "type close without a matching open".to_string(),
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(closed),
                        None => roots.push(closed),
                    }
                }
                TokenKind::Annotation { body } => {
                    let current = stack.last_mut().ok_or_else(|| Error::Parse {
                        file: self.file.to_string(),
                        line: token.line,
                        reason: "annotation outside of a type declaration".to_string(),
                    })?;
                    let mut line_parser = AnnotationParser::new(body, self.file, token.line);
                    line_parser.parse_into(current)?;
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::Parse {
                file: self.file.to_string(),
                line: open.line,
                reason: format!("type '{}' is never closed", open.name),
            });
        }

        Ok(roots)
    }
}

/// Recursive-descent parser over a single annotation payload.
struct AnnotationParser<'a> {
    input: &'a str,
    pos: usize,
    file: &'a str,
    line: u32,
}

impl<'a> AnnotationParser<'a> {
    fn new(input: &'a str, file: &'a str, line: u32) -> Self {
        Self {
            input,
            pos: 0,
            file,
            line,
        }
    }

    /// Parse the payload and attach the result to `ty`.
    fn parse_into(&mut self, ty: &mut TypeDeclaration) -> Result<()> {
        let name = self.ident("dependency name")?;

        if self.eat(".") {
            return self.parse_property(&name, ty);
        }

        let declaration = if self.eat("<-") {
            let abstracts = self.type_list()?;
            self.expect_end()?;
            DependencyDeclaration::Reference(Reference {
                name: name.clone(),
                abstracts,
                line: self.line,
            })
        } else if self.eat("<=") {
            let param_type = self.type_ref()?;
            self.expect_end()?;
            DependencyDeclaration::Parameter(Parameter {
                name: name.clone(),
                ty: param_type,
                line: self.line,
            })
        } else if self.eat("=") {
            let concrete = self.type_ref()?;
            let abstracts = if self.eat("<-") {
                self.type_list()?
            } else {
                Vec::new()
            };
            let params = if self.eat("<=") {
                self.type_list()?
            } else {
                Vec::new()
            };
            self.expect_end()?;
            DependencyDeclaration::Registration(Registration {
                name: name.clone(),
                concrete,
                abstracts,
                scope: Scope::default(),
                custom_ref: false,
                params,
                line: self.line,
            })
        } else {
            return Err(self.error("expected '=', '<-' or '<=' after dependency name"));
        };

        if ty.declarations.iter().any(|d| d.name() == name) {
            return Err(self.error(&format!(
                "dependency '{}' is already declared in type '{}'",
                name, ty.name
            )));
        }
        ty.declarations.push(declaration);
        Ok(())
    }

    /// Parse `name.scope = ...` / `name.customRef = ...` and apply it to an
    /// earlier registration in the same type.
    fn parse_property(&mut self, name: &str, ty: &mut TypeDeclaration) -> Result<()> {
        let property = self.ident("property name")?;
        self.expect("=")?;

        let registration = match ty
            .declarations
            .iter_mut()
            .rev()
            .find(|d| d.name() == name)
        {
            Some(DependencyDeclaration::Registration(r)) => r,
            Some(_) => {
                return Err(Error::Parse {
                    file: self.file.to_string(),
                    line: self.line,
                    reason: format!("'{}' is not a registration, properties only apply to registrations", name),
                })
            }
            None => {
                return Err(Error::Parse {
                    file: self.file.to_string(),
                    line: self.line,
                    reason: format!("property assigned to undeclared dependency '{}'", name),
                })
            }
        };

        match property.as_str() {
            "scope" => {
                // Accept an optional leading dot, as written in enum-literal style
                self.eat(".");
                let word = self.ident("scope value")?;
                registration.scope = word
                    .parse::<Scope>()
                    .map_err(|_| Error::Parse {
                        file: self.file.to_string(),
                        line: self.line,
                        reason: format!(
                            "unknown scope '{}', expected transient, graph, container or weak",
                            word
                        ),
                    })?;
            }
            "customRef" => {
                let word = self.ident("boolean value")?;
                registration.custom_ref = match word.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(Error::Parse {
                            file: self.file.to_string(),
                            line: self.line,
                            reason: format!("customRef expects true or false, got '{}'", word),
                        })
                    }
                };
            }
            other => {
                return Err(Error::Parse {
                    file: self.file.to_string(),
                    line: self.line,
                    reason: format!("unknown property '{}'", other),
                })
            }
        }

        self.expect_end()
    }

    fn type_ref(&mut self) -> Result<TypeRef> {
        let name = self.ident("type name")?;
        let optional = self.eat("?");
        Ok(TypeRef { name, optional })
    }

    fn type_list(&mut self) -> Result<Vec<TypeRef>> {
        let mut types = vec![self.type_ref()?];
        while self.eat(",") {
            types.push(self.type_ref()?);
        }
        Ok(types)
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        self.skip_ws();
        let rest = &self.input[self.pos..];
        let end = rest
            .char_indices()
            .find(|(i, c)| {
                if *i == 0 {
                    !(c.is_alphabetic() || *c == '_')
                } else {
                    !(c.is_alphanumeric() || *c == '_')
                }
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error(&format!("expected {}", what)));
        }
        self.pos += end;
        Ok(rest[..end].to_string())
    }

    /// Consume `lit` if it is next, skipping leading whitespace.
    fn eat(&mut self, lit: &str) -> bool {
        self.skip_ws();
        if self.input[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, lit: &str) -> Result<()> {
        if self.eat(lit) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", lit)))
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        self.skip_ws();
        if self.pos < self.input.len() {
            Err(self.error(&format!(
                "unexpected trailing content '{}'",
                &self.input[self.pos..]
            )))
        } else {
            Ok(())
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.input[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    fn error(&self, reason: &str) -> Error {
        Error::Parse {
            file: self.file.to_string(),
            line: self.line,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_source(source: &str) -> Result<Vec<TypeDeclaration>> {
        let tokens = Lexer::new(source, "test.swift").tokenize()?;
        Parser::new(&tokens, "test.swift").parse()
    }

    #[test]
    fn test_registration_forms() {
        let forest = parse_source(
            r#"
class MyService {
    // weft: session = Session
    // weft: api = API <- APIProtocol, APIOther
    // weft: worker = Worker <- WorkerProtocol <= UInt, String
}
"#,
        )
        .unwrap();

        let decls: Vec<_> = forest[0].registrations().collect();
        assert_eq!(decls.len(), 3);

        assert_eq!(decls[0].name, "session");
        assert_eq!(decls[0].concrete, TypeRef::new("Session"));
        assert!(decls[0].abstracts.is_empty());
        assert_eq!(decls[0].scope, Scope::Graph);

        assert_eq!(
            decls[1].abstracts,
            vec![TypeRef::new("APIProtocol"), TypeRef::new("APIOther")]
        );

        assert_eq!(
            decls[2].params,
            vec![TypeRef::new("UInt"), TypeRef::new("String")]
        );
    }

    #[test]
    fn test_reference_and_parameter_forms() {
        let forest = parse_source(
            r#"
class MyService {
    // weft: api <- APIProtocol
    // weft: movieID <= UInt
}
"#,
        )
        .unwrap();

        let refs: Vec<_> = forest[0].references().collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "api");
        assert_eq!(refs[0].abstracts, vec![TypeRef::new("APIProtocol")]);

        let params: Vec<_> = forest[0].parameters().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].ty, TypeRef::new("UInt"));
    }

    #[test]
    fn test_optional_marker_is_preserved() {
        let forest = parse_source(
            r#"
class MyService {
    // weft: session = Session? <- SessionProtocol?
}
"#,
        )
        .unwrap();

        let reg = forest[0].registrations().next().unwrap();
        assert_eq!(reg.concrete, TypeRef::optional("Session"));
        assert_eq!(reg.abstracts, vec![TypeRef::optional("SessionProtocol")]);
    }

    #[test]
    fn test_scope_and_custom_ref_properties() {
        let forest = parse_source(
            r#"
class MyService {
    // weft: api = API <- APIProtocol
    // weft: api.scope = container
    // weft: api.customRef = true
    // weft: router = Router
    // weft: router.scope = .weak
}
"#,
        )
        .unwrap();

        let regs: Vec<_> = forest[0].registrations().collect();
        assert_eq!(regs[0].scope, Scope::Container);
        assert!(regs[0].custom_ref);
        // Leading dot on the scope value is accepted
        assert_eq!(regs[1].scope, Scope::Weak);
    }

    #[test]
    fn test_property_on_undeclared_name_fails() {
        let err = parse_source(
            r#"
class MyService {
    // weft: api.scope = container
}
"#,
        )
        .unwrap_err();

        match err {
            Error::Parse { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("undeclared"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_property_on_reference_fails() {
        let err = parse_source(
            r#"
class MyService {
    // weft: api <- APIProtocol
    // weft: api.scope = container
}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));
    }

    #[test]
    fn test_duplicate_name_fails() {
        let err = parse_source(
            r#"
class MyService {
    // weft: api = API
    // weft: api = OtherAPI
}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));
    }

    #[test]
    fn test_malformed_declaration_fails_with_line() {
        let err = parse_source(
            r#"
class MyService {
    // weft: api = API <-
}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_annotation_outside_type_fails() {
        let err = parse_source("// weft: api = API\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_nesting_attaches_to_innermost_type() {
        let forest = parse_source(
            r#"
class Outer {
    // weft: a = A
    class Inner {
        // weft: b = B
    }
}
"#,
        )
        .unwrap();

        assert_eq!(forest.len(), 1);
        let outer = &forest[0];
        assert_eq!(outer.registrations().count(), 1);
        assert_eq!(outer.children.len(), 1);
        assert_eq!(outer.children[0].name, "Inner");
        assert_eq!(outer.children[0].registrations().next().unwrap().name, "b");
    }

    #[test]
    fn test_unannotated_type_is_recorded_as_zero_declaration_node() {
        let forest = parse_source(
            r#"
class Plain {
    func noop() {}
}
"#,
        )
        .unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "Plain");
        assert!(!forest[0].has_local_declarations());
    }
}
