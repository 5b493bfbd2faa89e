//! Generator - renders validated declarations into target source text
//!
//! For each type with at least one declaration directly in its body, the
//! generator assembles a [`ContainerModel`] and hands it to the template.
//! Types without local declarations yield absence, never empty text, so
//! callers can tell "nothing to write" from "wrote an empty file". Each
//! type's model is self-contained once the graph is validated, so rendering
//! is independent per type.

pub mod model;

pub use model::{
    ChildModel, ContainerModel, CustomRefModel, ParameterModel, RegistrationModel, ResolverModel,
};

use crate::ast::{Registration, TypeDeclaration, TypeRef};
use crate::inspector::{DependencyGraph, NodeId};
use crate::{Error, Result};
use handlebars::Handlebars;

/// The default container/resolver template, embedded in the binary.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/container.hbs");

/// One output unit per type declaration.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub type_name: String,
    /// Dot-joined nesting path (`Outer.Inner`)
    pub qualified_name: String,
    /// Source file the type came from
    pub file: String,
    /// Rendered text, absent for types with no local declarations
    pub text: Option<String>,
}

/// Render every type declaration in the forest against the template.
///
/// `template` defaults to [`DEFAULT_TEMPLATE`]. The forest is expected to
/// have passed [`crate::inspector::validate`]; unresolved references are
/// still reported rather than panicking.
pub fn generate(forest: &[TypeDeclaration], template: Option<&str>) -> Result<Vec<GeneratedUnit>> {
    let graph = DependencyGraph::build(forest)?;

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("container", template.unwrap_or(DEFAULT_TEMPLATE))?;

    let mut units = Vec::with_capacity(graph.nodes().len());
    for (index, node) in graph.nodes().iter().enumerate() {
        let id = NodeId(index as u32);
        let qualified_name = qualified_name(&graph, id, &node.decl.name);

        let text = if node.decl.has_local_declarations() {
            let model = build_model(&graph, id, &qualified_name)?;
            Some(handlebars.render("container", &model)?)
        } else {
            None
        };

        units.push(GeneratedUnit {
            type_name: node.decl.name.clone(),
            qualified_name,
            file: node.decl.file.clone(),
            text,
        });
    }

    Ok(units)
}

fn qualified_name(graph: &DependencyGraph<'_>, id: NodeId, name: &str) -> String {
    let mut parts = graph.ancestor_names(id);
    parts.push(name);
    parts.join(".")
}

/// Assemble the rendering model for one annotated type.
fn build_model(
    graph: &DependencyGraph<'_>,
    id: NodeId,
    qualified_name: &str,
) -> Result<ContainerModel> {
    let node = &graph.nodes()[id.0 as usize];
    let decl = node.decl;

    let parameters: Vec<ParameterModel> = decl
        .parameters()
        .map(|p| ParameterModel {
            name: p.name.clone(),
            ty: p.ty.to_string(),
        })
        .collect();

    let mut registrations = Vec::new();
    let mut resolvers = Vec::new();
    let mut custom_refs = Vec::new();

    for declaration in &decl.declarations {
        match declaration {
            crate::ast::DependencyDeclaration::Registration(r) => {
                let params = inherited_parameters(graph, r);
                let registered_type = r.registered_type().to_string();

                registrations.push(RegistrationModel {
                    name: r.name.clone(),
                    registered_type: registered_type.clone(),
                    concrete_type: r.concrete.to_string(),
                    abstract_types: r.abstracts.iter().map(TypeRef::to_string).collect(),
                    scope: r.scope.to_string(),
                    custom_ref: r.custom_ref,
                    builder: builder_expression(graph, r, &params),
                    has_parameters: !params.is_empty(),
                    parameters: params.clone(),
                });

                resolvers.push(ResolverModel {
                    name: r.name.clone(),
                    resolved_type: registered_type.clone(),
                    has_parameters: !params.is_empty(),
                    parameters: params.clone(),
                });

                if r.custom_ref {
                    custom_refs.push(CustomRefModel {
                        hook: format!("{}CustomRef", r.name),
                        resolved_type: registered_type,
                        parameters: params,
                    });
                }
            }
            crate::ast::DependencyDeclaration::Reference(r) => {
                let registration = graph
                    .resolve_reference(id, &r.name, &r.abstracts)
                    .ok_or_else(|| Error::UnresolvableDependency {
                        file: decl.file.clone(),
                        line: r.line,
                        name: r.name.clone(),
                        type_name: r
                            .abstracts
                            .first()
                            .map(TypeRef::to_string)
                            .unwrap_or_default(),
                    })?;
                let params = inherited_parameters(graph, registration);

                resolvers.push(ResolverModel {
                    name: r.name.clone(),
                    resolved_type: r
                        .abstracts
                        .first()
                        .map(TypeRef::to_string)
                        .unwrap_or_default(),
                    has_parameters: !params.is_empty(),
                    parameters: params,
                });
            }
            crate::ast::DependencyDeclaration::Parameter(_) => {}
        }
    }

    let children = decl
        .children
        .iter()
        .filter(|c| c.has_declarations_recursive())
        .map(|c| ChildModel {
            type_name: c.name.clone(),
            qualified_name: format!("{}.{}", qualified_name, c.name),
        })
        .collect();

    Ok(ContainerModel {
        version: env!("CARGO_PKG_VERSION").to_string(),
        type_name: decl.name.clone(),
        qualified_name: qualified_name.to_string(),
        nested: node.parent.is_some(),
        has_parameters: !parameters.is_empty(),
        parameters,
        registrations,
        resolvers,
        custom_refs,
        children,
    })
}

/// Parameters a registration requires: the concrete type's own parameter
/// declarations, then any types listed inline on the registration line.
fn inherited_parameters(graph: &DependencyGraph<'_>, r: &Registration) -> Vec<ParameterModel> {
    let mut params: Vec<ParameterModel> = graph
        .type_node(&r.concrete.name)
        .map(|target| {
            graph.nodes()[target.0 as usize]
                .decl
                .parameters()
                .map(|p| ParameterModel {
                    name: p.name.clone(),
                    ty: p.ty.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    // Inline parameter types carry no name; index them
    for (index, ty) in r.params.iter().enumerate() {
        let name = if index == 0 && params.is_empty() {
            "parameter".to_string()
        } else {
            format!("parameter{}", params.len())
        };
        params.push(ParameterModel {
            name,
            ty: ty.to_string(),
        });
    }

    params
}

/// Builder expression for a registration: the custom hook when requested,
/// the generated factory when the concrete type is itself annotated, or a
/// plain constructor call.
fn builder_expression(
    graph: &DependencyGraph<'_>,
    r: &Registration,
    params: &[ParameterModel],
) -> String {
    let args: String = params
        .iter()
        .map(|p| format!(", {}: {}", p.name, p.name))
        .collect();

    if r.custom_ref {
        return format!("self.{}CustomRef(dependencies{})", r.name, args);
    }

    let annotated = graph
        .type_node(&r.concrete.name)
        .map(|id| graph.nodes()[id.0 as usize].decl.has_declarations_recursive())
        .unwrap_or(false);

    if annotated {
        format!(
            "{name}.make{name}(injecting: dependencies{args})",
            name = r.concrete.name,
            args = args
        )
    } else {
        format!("{}()", r.concrete.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    const GOLDEN_SOURCE: &str = r#"
public final class MyService {
  let dependencies: DependencyResolver

  // weft: api = API <- APIProtocol
  // weft: api.scope = graph
  // weft: api.customRef = true

  // weft: apiBis = API <- APIProtocol
  // weft: apiBis.scope = container

  // weft: router = Router <- RouterProtocol
  // weft: router.scope = container

  // weft: session = Session

  final class MyEmbeddedService {

    // weft: session = Session? <- SessionProtocol?
    // weft: session.scope = container

    // weft: api <- APIProtocol

    // weft: apiBis <- APIProtocol
  }

  init(_ dependencies: DependencyResolver) {
    self.dependencies = dependencies
  }
}

final class API: APIProtocol {
    // weft: parameter <= UInt
}

class AnotherService {
    // This class is ignored
}
"#;

    fn parse(source: &str) -> Vec<TypeDeclaration> {
        let tokens = Lexer::new(source, "test.swift").tokenize().unwrap();
        Parser::new(&tokens, "test.swift").parse().unwrap()
    }

    fn unit<'a>(units: &'a [GeneratedUnit], name: &str) -> &'a GeneratedUnit {
        units.iter().find(|u| u.type_name == name).unwrap()
    }

    #[test]
    fn test_golden_scenario_units() {
        let forest = parse(GOLDEN_SOURCE);
        crate::inspector::validate(&forest).unwrap();
        let units = generate(&forest, None).unwrap();

        assert_eq!(units.len(), 4);

        let service = unit(&units, "MyService").text.as_deref().unwrap();
        assert!(service.contains("// MARK: - MyService"));
        assert!(service
            .contains("final class MyServiceDependencyContainer: DependencyContainer {"));
        // api: custom builder hook, graph scope, API's parameter propagated
        assert!(service.contains(
            "store.register(APIProtocol.self, scope: .graph, name: \"api\", builder: { (dependencies, parameter: UInt) in"
        ));
        assert!(service.contains("return self.apiCustomRef(dependencies, parameter: parameter)"));
        // apiBis: standard factory path through the annotated API type
        assert!(service.contains(
            "store.register(APIProtocol.self, scope: .container, name: \"apiBis\", builder: { (dependencies, parameter: UInt) in"
        ));
        assert!(service.contains("return API.makeAPI(injecting: dependencies, parameter: parameter)"));
        // router and session: plain constructor calls, Router is unannotated
        assert!(service.contains(
            "store.register(RouterProtocol.self, scope: .container, name: \"router\", builder: { (dependencies) in"
        ));
        assert!(service.contains("return Router()"));
        assert!(service.contains(
            "store.register(Session.self, scope: .graph, name: \"session\", builder: { (dependencies) in"
        ));
        assert!(service.contains("return Session()"));
        // resolver surface: functions when parameterized, getters otherwise
        assert!(service.contains("func api(parameter: UInt) -> APIProtocol"));
        assert!(service.contains("var router: RouterProtocol { get }"));
        assert!(service.contains("var session: Session { get }"));
        assert!(service.contains("func apiBis(parameter: UInt) -> APIProtocol"));
        assert!(service.contains(
            "func apiCustomRef(_ dependencies: DependencyContainer, parameter: UInt) -> APIProtocol"
        ));
        assert!(service.contains("return resolve(APIProtocol.self, name: \"api\", parameter: parameter)"));
        assert!(service.contains("return resolve(RouterProtocol.self, name: \"router\")"));

        let embedded = unit(&units, "MyEmbeddedService");
        assert_eq!(embedded.qualified_name, "MyService.MyEmbeddedService");
        let embedded = embedded.text.as_deref().unwrap();
        // chained to the parent container
        assert!(embedded.contains("init(parent: DependencyContainer) {"));
        assert!(embedded.contains("super.init(parent)"));
        // optional marker propagates into registration and resolver
        assert!(embedded.contains(
            "store.register(SessionProtocol?.self, scope: .container, name: \"session\", builder: { (dependencies) in"
        ));
        assert!(embedded.contains("var session: SessionProtocol? { get }"));
        assert!(embedded.contains("return resolve(SessionProtocol?.self, name: \"session\")"));
        // references pick up the ancestor registration's parameters
        assert!(embedded.contains("func api(parameter: UInt) -> APIProtocol"));
        assert!(embedded.contains("func apiBis(parameter: UInt) -> APIProtocol"));
        // nested factory chained to the parent
        assert!(embedded.contains("extension MyService.MyEmbeddedService {"));
        assert!(embedded.contains(
            "static func makeMyEmbeddedService(injecting parentDependencies: DependencyContainer) -> MyEmbeddedService {"
        ));

        let api = unit(&units, "API").text.as_deref().unwrap();
        // the declared parameter is stored on the container and exposed
        assert!(api.contains("let parameter: UInt"));
        assert!(api.contains("init(parameter: UInt) {"));
        assert!(api.contains("var parameter: UInt { get }"));
    }

    #[test]
    fn test_unannotated_type_yields_absence_not_empty_text() {
        let forest = parse(GOLDEN_SOURCE);
        let units = generate(&forest, None).unwrap();

        let ignored = unit(&units, "AnotherService");
        assert!(ignored.text.is_none());
    }

    #[test]
    fn test_fully_unannotated_file_yields_only_absence() {
        let forest = parse(
            r#"
final class MyService {
  let dependencies: DependencyResolver

  init(_ dependencies: DependencyResolver) {
    self.dependencies = dependencies
  }
}
"#,
        );
        let units = generate(&forest, None).unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].text.is_none());
    }

    #[test]
    fn test_generation_is_idempotent() {
        let forest = parse(GOLDEN_SOURCE);
        let first = generate(&forest, None).unwrap();
        let second = generate(&forest, None).unwrap();

        let texts = |units: &[GeneratedUnit]| -> Vec<Option<String>> {
            units.iter().map(|u| u.text.clone()).collect()
        };
        assert_eq!(texts(&first), texts(&second));
    }

    #[test]
    fn test_custom_template() {
        let forest = parse(
            r#"
class Logger {
    // weft: engine = LogEngine
}
"#,
        );
        let units = generate(&forest, Some("unit {{type_name}}\n")).unwrap();
        assert_eq!(units[0].text.as_deref(), Some("unit Logger\n"));
    }

    #[test]
    fn test_missing_model_field_is_a_template_error() {
        let forest = parse(
            r#"
class Logger {
    // weft: engine = LogEngine
}
"#,
        );
        let err = generate(&forest, Some("{{no_such_field}}")).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_version_header() {
        let forest = parse(
            r#"
class Logger {
    // weft: engine = LogEngine
}
"#,
        );
        let units = generate(&forest, None).unwrap();
        let text = units[0].text.as_deref().unwrap();
        assert!(text.starts_with(&format!(
            "/// This file is generated by weft {}\n/// DO NOT EDIT!",
            env!("CARGO_PKG_VERSION")
        )));
    }
}
