//! Inspector - global graph validation
//!
//! Merges the per-file syntax trees into one dependency graph, resolves every
//! reference through the ancestor chain, and checks the directed edge set for
//! cycles with the weak-edge escape hatch. This is the only stage that needs
//! the whole forest at once; it runs single-threaded after all parse tasks
//! complete.

pub mod graph;

pub use graph::{DependencyEdge, DependencyGraph, NodeId};

use crate::ast::TypeDeclaration;
use crate::Result;

/// Validate the merged forest.
///
/// On success the forest is guaranteed fully resolvable and acyclic modulo
/// weak edges, ready for generation. On failure the first diagnostic in
/// forest order is returned and the whole batch aborts.
pub fn validate(forest: &[TypeDeclaration]) -> Result<()> {
    let graph = DependencyGraph::build(forest)?;
    graph.check_cycles()?;
    tracing::debug!(
        types = graph.nodes().len(),
        "dependency graph validated"
    );
    Ok(())
}
