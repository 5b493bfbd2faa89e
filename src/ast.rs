//! Abstract syntax tree for annotated type declarations
//!
//! Each parsed file yields a forest of [`TypeDeclaration`] nodes mirroring the
//! nominal-type nesting of the source. Dependency declarations attach to the
//! innermost enclosing type. Three declaration shapes exist:
//! - `Registration`: supplies a concrete buildable type for a name
//! - `Reference`: requests a name/type from an ancestor
//! - `Parameter`: declares a construction parameter of the enclosing type

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Sharing/lifetime policy for a registered dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// New instance per resolution
    Transient,
    /// One instance per container instance, lazily built (the default)
    #[default]
    Graph,
    /// Instance shared across the container subtree from the declaring node down
    Container,
    /// Back-reference resolved lazily; the only scope allowed to close a cycle
    Weak,
}

impl Scope {
    /// Get the string representation of the scope
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Transient => "transient",
            Scope::Graph => "graph",
            Scope::Container => "container",
            Scope::Weak => "weak",
        }
    }

    /// Get all scopes
    pub fn all() -> &'static [Scope] {
        &[Scope::Transient, Scope::Graph, Scope::Container, Scope::Weak]
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "transient" => Ok(Scope::Transient),
            "graph" => Ok(Scope::Graph),
            "container" => Ok(Scope::Container),
            "weak" => Ok(Scope::Weak),
            _ => Err(Error::UnknownScope(s.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named type, optionally marked optional (`Session?`).
///
/// The optional marker is part of the type's identity: `Session?` and
/// `Session` are distinct types and the marker propagates into generated
/// signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub optional: bool,
}

impl TypeRef {
    /// Create a required type reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    /// Create an optional type reference
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "{}?", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A registration: introduces a name backed by a concrete buildable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    /// The concrete type instantiated by the container
    pub concrete: TypeRef,
    /// Abstract types through which the dependency may be referenced
    pub abstracts: Vec<TypeRef>,
    pub scope: Scope,
    /// When true, the container calls a user-supplied builder hook instead of
    /// the standard constructor path
    pub custom_ref: bool,
    /// Parameter types declared inline on the registration (`<=` tail)
    pub params: Vec<TypeRef>,
    pub line: u32,
}

impl Registration {
    /// The type under which the dependency is registered and resolved:
    /// the first abstract type if any, else the concrete type.
    pub fn registered_type(&self) -> &TypeRef {
        self.abstracts.first().unwrap_or(&self.concrete)
    }

    /// Whether this registration can satisfy a request for `requested`,
    /// either through its concrete type or one of its abstract types.
    pub fn satisfies(&self, requested: &TypeRef) -> bool {
        self.concrete == *requested || self.abstracts.contains(requested)
    }
}

/// A reference: requests a name/type expected to be registered by an ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    /// Requested abstract types; all must be satisfied by the same ancestor
    /// registration
    pub abstracts: Vec<TypeRef>,
    pub line: u32,
}

/// A construction parameter of the enclosing type (`name <= Type`).
///
/// Every registration of the enclosing concrete type inherits the parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub line: u32,
}

/// One dependency declaration attached to a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyDeclaration {
    Registration(Registration),
    Reference(Reference),
    Parameter(Parameter),
}

impl DependencyDeclaration {
    /// The declared name
    pub fn name(&self) -> &str {
        match self {
            DependencyDeclaration::Registration(r) => &r.name,
            DependencyDeclaration::Reference(r) => &r.name,
            DependencyDeclaration::Parameter(p) => &p.name,
        }
    }

    /// The source line of the declaration
    pub fn line(&self) -> u32 {
        match self {
            DependencyDeclaration::Registration(r) => r.line,
            DependencyDeclaration::Reference(r) => r.line,
            DependencyDeclaration::Parameter(p) => p.line,
        }
    }
}

/// A nominal-type declaration node.
///
/// Forms a tree per file; trees from different files are siblings at the
/// root of the forest handed to the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    /// File the type was declared in, for diagnostics
    pub file: String,
    /// Line of the type-open token (1-indexed)
    pub line: u32,
    /// Nested type declarations, in source order
    pub children: Vec<TypeDeclaration>,
    /// Dependency declarations attached directly to this type, in source order
    pub declarations: Vec<DependencyDeclaration>,
}

impl TypeDeclaration {
    /// Create an empty type declaration node
    pub fn new(name: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line,
            children: Vec::new(),
            declarations: Vec::new(),
        }
    }

    /// Whether any dependency declaration is attached directly to this type.
    ///
    /// This is the positive "produces output" signal for the generator; types
    /// where it is false yield absence, not empty text.
    pub fn has_local_declarations(&self) -> bool {
        !self.declarations.is_empty()
    }

    /// Whether this type or any nested type carries declarations
    pub fn has_declarations_recursive(&self) -> bool {
        self.has_local_declarations()
            || self.children.iter().any(|c| c.has_declarations_recursive())
    }

    /// Registrations attached directly to this type, in source order
    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.declarations.iter().filter_map(|d| match d {
            DependencyDeclaration::Registration(r) => Some(r),
            _ => None,
        })
    }

    /// References attached directly to this type, in source order
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.declarations.iter().filter_map(|d| match d {
            DependencyDeclaration::Reference(r) => Some(r),
            _ => None,
        })
    }

    /// Construction parameters declared directly on this type, in source order
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.declarations.iter().filter_map(|d| match d {
            DependencyDeclaration::Parameter(p) => Some(p),
            _ => None,
        })
    }
}
