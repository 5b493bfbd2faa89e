//! Dependency graph over the merged forest
//!
//! The graph is an arena of nodes with explicit parent indices: one node per
//! type declaration, with ancestor visibility modeled as a walk over parent
//! links. Directed edges come from registrations and resolved references and
//! carry the declaration's scope for the cycle policy.

use crate::ast::{Registration, Scope, TypeDeclaration, TypeRef};
use crate::{Error, Result};
use std::collections::HashMap;

/// Index of a node in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// One type declaration in the arena
#[derive(Debug)]
pub struct Node<'a> {
    pub decl: &'a TypeDeclaration,
    pub parent: Option<NodeId>,
}

/// A directed dependency edge, labeled with the declaring scope.
#[derive(Debug, Clone)]
pub struct DependencyEdge<'a> {
    pub from: NodeId,
    pub to: NodeId,
    pub scope: Scope,
    /// Name of the declaration that produced the edge
    pub name: &'a str,
    /// Display form of the dependency's type, for diagnostics
    pub type_name: String,
    pub file: &'a str,
    pub line: u32,
}

/// The merged, immutable dependency graph.
pub struct DependencyGraph<'a> {
    nodes: Vec<Node<'a>>,
    /// Type name → nodes carrying that name, in forest order
    by_name: HashMap<&'a str, Vec<NodeId>>,
    /// Outgoing edges per node
    edges_from: Vec<Vec<DependencyEdge<'a>>>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph from the merged forest.
    ///
    /// Fails with [`Error::UnresolvableDependency`] when a reference has no
    /// matching registration anywhere on its ancestor chain.
    pub fn build(forest: &'a [TypeDeclaration]) -> Result<Self> {
        let mut graph = Self {
            nodes: Vec::new(),
            by_name: HashMap::new(),
            edges_from: Vec::new(),
        };

        for root in forest {
            graph.index_type(root, None);
        }
        graph.edges_from = vec![Vec::new(); graph.nodes.len()];
        graph.build_edges()?;

        Ok(graph)
    }

    /// Pre-order indexing, so node order matches source order per file.
    fn index_type(&mut self, decl: &'a TypeDeclaration, parent: Option<NodeId>) {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { decl, parent });
        self.by_name.entry(&decl.name).or_default().push(id);
        for child in &decl.children {
            self.index_type(child, Some(id));
        }
    }

    fn build_edges(&mut self) -> Result<()> {
        let mut edges: Vec<DependencyEdge<'a>> = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let from = NodeId(index as u32);

            for registration in node.decl.registrations() {
                if let Some(to) = self.type_node(&registration.concrete.name) {
                    edges.push(DependencyEdge {
                        from,
                        to,
                        scope: registration.scope,
                        name: &registration.name,
                        type_name: registration.concrete.to_string(),
                        file: &node.decl.file,
                        line: registration.line,
                    });
                }
            }

            for reference in node.decl.references() {
                let requested = &reference.abstracts;
                let registration = self
                    .resolve_reference(from, &reference.name, requested)
                    .ok_or_else(|| Error::UnresolvableDependency {
                        file: node.decl.file.clone(),
                        line: reference.line,
                        name: reference.name.clone(),
                        type_name: requested
                            .first()
                            .map(TypeRef::to_string)
                            .unwrap_or_default(),
                    })?;
                if let Some(to) = self.type_node(&registration.concrete.name) {
                    edges.push(DependencyEdge {
                        from,
                        to,
                        scope: registration.scope,
                        name: &reference.name,
                        type_name: requested
                            .first()
                            .map(TypeRef::to_string)
                            .unwrap_or_default(),
                        file: &node.decl.file,
                        line: reference.line,
                    });
                }
            }
        }

        for edge in edges {
            self.edges_from[edge.from.0 as usize].push(edge);
        }
        Ok(())
    }

    /// Resolve a reference by walking the ancestor chain, nearest first.
    ///
    /// A registration matches when its name equals the reference's name and
    /// its concrete type or any abstract type satisfies every requested type.
    pub fn resolve_reference(
        &self,
        from: NodeId,
        name: &str,
        requested: &[TypeRef],
    ) -> Option<&'a Registration> {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &self.nodes[id.0 as usize];
            let found = node.decl.registrations().find(|registration| {
                registration.name == name
                    && requested.iter().all(|t| registration.satisfies(t))
            });
            if let Some(registration) = found {
                return Some(registration);
            }
            current = node.parent;
        }
        None
    }

    /// Node representing a type name, if that type is declared anywhere in
    /// the forest. The first declaration in forest order wins.
    pub fn type_node(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).and_then(|ids| ids.first().copied())
    }

    /// All nodes, in pre-order forest order
    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    /// Parent chain names from the root down to (excluding) the node itself
    pub fn ancestor_names(&self, id: NodeId) -> Vec<&'a str> {
        let mut names = Vec::new();
        let mut current = self.nodes[id.0 as usize].parent;
        while let Some(parent) = current {
            let node = &self.nodes[parent.0 as usize];
            names.push(node.decl.name.as_str());
            current = node.parent;
        }
        names.reverse();
        names
    }

    /// Outgoing edges of a node
    pub fn edges_from(&self, id: NodeId) -> &[DependencyEdge<'a>] {
        &self.edges_from[id.0 as usize]
    }

    /// Check the directed edge set for cycles, allowing any cycle that
    /// contains at least one weak edge.
    ///
    /// A cycle carries a weak edge exactly when it vanishes from the subgraph
    /// of non-weak edges, so that subgraph must be acyclic. The traversal
    /// walks non-weak edges only; any back edge there closes a forbidden
    /// cycle and is reported.
    pub fn check_cycles(&self) -> Result<()> {
        let mut on_path = vec![false; self.nodes.len()];
        let mut done = vec![false; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if !done[start] {
                self.dfs(start, &mut on_path, &mut done)?;
            }
        }
        Ok(())
    }

    fn dfs(&self, node: usize, on_path: &mut [bool], done: &mut [bool]) -> Result<()> {
        on_path[node] = true;

        for edge in &self.edges_from[node] {
            if edge.scope == Scope::Weak {
                continue;
            }
            let next = edge.to.0 as usize;
            if on_path[next] {
                return Err(Error::CyclicDependency {
                    file: edge.file.to_string(),
                    line: edge.line,
                    name: edge.name.to_string(),
                    type_name: edge.type_name.clone(),
                });
            }
            if !done[next] {
                self.dfs(next, on_path, done)?;
            }
        }

        on_path[node] = false;
        done[node] = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(source: &str) -> Vec<TypeDeclaration> {
        let tokens = Lexer::new(source, "test.swift").tokenize().unwrap();
        Parser::new(&tokens, "test.swift").parse().unwrap()
    }

    #[test]
    fn test_arena_parent_indices() {
        let forest = parse(
            r#"
class App {
    class Screen {
        class Widget {
        }
    }
}
"#,
        );
        let graph = DependencyGraph::build(&forest).unwrap();

        let names: Vec<_> = graph.nodes().iter().map(|n| n.decl.name.as_str()).collect();
        assert_eq!(names, vec!["App", "Screen", "Widget"]);
        assert_eq!(graph.nodes()[0].parent, None);
        assert_eq!(graph.nodes()[1].parent, Some(NodeId(0)));
        assert_eq!(graph.nodes()[2].parent, Some(NodeId(1)));
        assert_eq!(graph.ancestor_names(NodeId(2)), vec!["App", "Screen"]);
    }

    #[test]
    fn test_type_node_lookup() {
        let forest = parse("class A {\n}\nclass B {\n}\n");
        let graph = DependencyGraph::build(&forest).unwrap();

        assert_eq!(graph.type_node("B"), Some(NodeId(1)));
        assert_eq!(graph.type_node("Missing"), None);
    }

    #[test]
    fn test_registration_edges_target_annotated_types_only() {
        let forest = parse(
            r#"
class App {
    // weft: api = API
    // weft: router = Router
}
class API {
    // weft: token <= String
}
"#,
        );
        let graph = DependencyGraph::build(&forest).unwrap();

        // Router is not declared anywhere, so only the API edge exists
        let edges = graph.edges_from(NodeId(0));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].name, "api");
        assert_eq!(edges[0].to, graph.type_node("API").unwrap());
        assert_eq!(edges[0].scope, Scope::Graph);
    }
}
