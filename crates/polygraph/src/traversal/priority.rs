use std::cmp::Ordering;

use crate::{Catalog, DetailedGraph, MonomerClass, NodeId, R3, Result};

/// How eagerly a walk should continue into a node, relative to its siblings
///
/// Ordered so that main-chain continuations come first: then branch monomers, then backbone linkers (like phosphates),
/// and chemical modifiers last.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum SiblingPriority {
    Other,
    Branch,
    Linker,
    Chemical,
}

impl SiblingPriority {
    pub fn of(graph: &DetailedGraph, catalog: &dyn Catalog, node: NodeId) -> Result<Self> {
        if graph.is_linker(catalog, node)? {
            return Ok(Self::Linker);
        }
        Ok(match graph.class(catalog, node)? {
            MonomerClass::Chemical => Self::Chemical,
            MonomerClass::Branch => Self::Branch,
            MonomerClass::Backbone => Self::Other,
        })
    }
}

/// Orders sibling nodes by their [`SiblingPriority`], treating unresolvable monomers as [`SiblingPriority::Other`]
pub fn by_priority<'g>(
    graph: &'g DetailedGraph,
    catalog: &'g dyn Catalog,
) -> impl Fn(NodeId, NodeId) -> Ordering + 'g {
    move |a, b| {
        let priority = |n| SiblingPriority::of(graph, catalog, n).unwrap_or(SiblingPriority::Other);
        priority(a).cmp(&priority(b))
    }
}

impl DetailedGraph {
    /// Whether `node` is a nucleic acid backbone unit without a branch point, like a phosphate
    pub fn is_linker(&self, catalog: &dyn Catalog, node: NodeId) -> Result<bool> {
        let polymer_type = self.node(node)?.monomer().polymer_type();
        let descriptor = self.descriptor(catalog, node)?;
        Ok(polymer_type.is_nucleic_acid()
            && descriptor.class == MonomerClass::Backbone
            && !descriptor.attachment_points.iter().any(|l| l == R3))
    }
}
