//! Rendering model handed to the template
//!
//! The generator's only job is assembling this structure without loss: every
//! declaration, parameter, and optional marker of an annotated type must
//! appear. Rendering itself is delegated to the template engine, whose
//! loop/conditional syntax the core treats as opaque.

use serde::Serialize;

/// Model for one annotated type: exactly one rendered unit per container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerModel {
    /// Tool version stamped into the generated header
    pub version: String,
    /// Simple name of the annotated type
    pub type_name: String,
    /// Dot-joined nesting path (`Outer.Inner`) for nested types
    pub qualified_name: String,
    /// Whether the type is nested and its container chains to a parent
    pub nested: bool,
    /// Construction parameters declared on the type itself
    pub parameters: Vec<ParameterModel>,
    pub has_parameters: bool,
    /// One entry per local registration, in declaration order
    pub registrations: Vec<RegistrationModel>,
    /// One resolver entry per local registration and reference
    pub resolvers: Vec<ResolverModel>,
    /// Builder hooks for registrations with `customRef = true`
    pub custom_refs: Vec<CustomRefModel>,
    /// Nested types with declarations anywhere in their subtree
    pub children: Vec<ChildModel>,
}

/// A named construction parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterModel {
    pub name: String,
    /// Display form of the parameter type, optional marker included
    #[serde(rename = "type")]
    pub ty: String,
}

/// One `register` call in the generated container
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationModel {
    pub name: String,
    /// Type the dependency is registered under (first abstract, else concrete)
    pub registered_type: String,
    pub concrete_type: String,
    /// Every abstract type the registration satisfies
    pub abstract_types: Vec<String>,
    pub scope: String,
    /// True when the builder delegates to a user-supplied hook
    pub custom_ref: bool,
    /// Pre-assembled builder expression for the default template
    pub builder: String,
    pub parameters: Vec<ParameterModel>,
    pub has_parameters: bool,
}

/// One resolver capability: a getter when parameterless, else a function
#[derive(Debug, Clone, Serialize)]
pub struct ResolverModel {
    pub name: String,
    pub resolved_type: String,
    pub parameters: Vec<ParameterModel>,
    pub has_parameters: bool,
}

/// A user-supplied builder hook requirement
#[derive(Debug, Clone, Serialize)]
pub struct CustomRefModel {
    /// Hook name (`{name}CustomRef`)
    pub hook: String,
    pub resolved_type: String,
    pub parameters: Vec<ParameterModel>,
}

/// A nested annotated type reachable from this container
#[derive(Debug, Clone, Serialize)]
pub struct ChildModel {
    pub type_name: String,
    pub qualified_name: String,
}
