//! A coarse, polymer-level summary of a [`DetailedGraph`], rebuilt for every encoding
//!
//! Each polymer becomes one hyper-node, holding the text of its monomer chain, and every connection that can't be
//! written inline as part of a chain becomes a hyper-edge between the polymers it joins.

use ahash::{HashMap, HashSet};
use itertools::Itertools;
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use polygraph::{
    Catalog, DetailedGraph, EdgeId, MonomerClass, NodeId, PolymerId, PolymerManager, PolymerType,
    R2, R3,
};
use tracing::debug;

use crate::errors::Result;

#[derive(Clone, Debug, Default)]
pub struct Hypergraph {
    graph: DiGraph<HyperNode, HyperEdge>,
    index: HashMap<PolymerId, NodeIndex>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HyperNode {
    polymer: PolymerId,
    body: String,
    positions: HashMap<NodeId, u32>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HyperEdge {
    pair: bool,
    description: String,
}

impl Hypergraph {
    /// Walks every polymer known to `manager`, then collects the connections those walks didn't write inline
    pub fn build(
        graph: &DetailedGraph,
        manager: &PolymerManager,
        catalog: &dyn Catalog,
    ) -> Result<Self> {
        let mut hypergraph = Self::default();
        let mut inline = HashSet::default();
        for (polymer, entry) in manager.polymers() {
            let walk = ChainWalk::new(graph, catalog, entry.polymer_type(), &mut inline);
            let (body, positions) = walk.run(polymer, entry.starting_node())?;
            let node = hypergraph.graph.add_node(HyperNode {
                polymer,
                body,
                positions,
            });
            hypergraph.index.insert(polymer, node);
        }

        for edge in graph.edge_ids() {
            if !inline.contains(&edge) {
                hypergraph.add_connection(graph, edge)?;
            }
        }
        Ok(hypergraph)
    }

    #[must_use]
    pub fn node(&self, polymer: PolymerId) -> Option<&HyperNode> {
        self.index.get(&polymer).map(|&node| &self.graph[node])
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every hyper-edge as `(source, target, edge)`, in the order they were added
    pub fn edges(&self) -> impl Iterator<Item = (PolymerId, PolymerId, &HyperEdge)> {
        self.graph.edge_references().map(|edge| {
            let source = self.graph[edge.source()].polymer;
            let target = self.graph[edge.target()].polymer;
            (source, target, edge.weight())
        })
    }

    /// The polymers joined to `polymer` by a pairing hyper-edge, in either direction
    #[must_use]
    pub fn pair_partners(&self, polymer: PolymerId) -> Vec<PolymerId> {
        let Some(&node) = self.index.get(&polymer) else {
            return Vec::new();
        };
        [Direction::Outgoing, Direction::Incoming]
            .into_iter()
            .flat_map(|direction| self.graph.edges_directed(node, direction))
            .filter(|edge| edge.weight().pair)
            .map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                self.graph[other].polymer
            })
            .filter(|&partner| partner != polymer)
            .unique()
            .collect()
    }

    fn add_connection(&mut self, graph: &DetailedGraph, edge: EdgeId) -> Result<()> {
        let (Some(weight), Some((source, target))) = (graph.edge(edge), graph.endpoints(edge)) else {
            return Ok(());
        };
        let ends = self.locate(graph, source)?.zip(self.locate(graph, target)?);
        let Some(((source_node, source_position), (target_node, target_position))) = ends else {
            debug!(edge = edge.index(), "skipping a connection to a monomer that was never walked");
            return Ok(());
        };

        let hyperedge = HyperEdge {
            pair: weight.kind().is_pair(),
            description: format!(
                "{source_position}:{}-{target_position}:{}",
                weight.source_label(),
                weight.target_label()
            ),
        };
        let duplicate = self
            .graph
            .edges_connecting(source_node, target_node)
            .any(|existing| existing.weight() == &hyperedge);
        if !duplicate {
            self.graph.add_edge(source_node, target_node, hyperedge);
        }
        Ok(())
    }

    fn locate(&self, graph: &DetailedGraph, node: NodeId) -> Result<Option<(NodeIndex, u32)>> {
        let polymer = graph.node(node)?.polymer();
        Ok(self.index.get(&polymer).and_then(|&hypernode| {
            let position = self.graph[hypernode].position_of(node)?;
            Some((hypernode, position))
        }))
    }
}

impl HyperNode {
    #[must_use]
    pub const fn polymer(&self) -> PolymerId {
        self.polymer
    }

    /// The chain of monomers, as written between the braces of the polymer
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The position a detailed node was written at
    #[must_use]
    pub fn position_of(&self, node: NodeId) -> Option<u32> {
        self.positions.get(&node).copied()
    }
}

impl HyperEdge {
    #[must_use]
    pub const fn is_pair(&self) -> bool {
        self.pair
    }

    /// Positions and attachment points of both ends, like `3:R3-1:R1`
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

// Chain Walks ---------------------------------------------------------------------------------------------------------

struct ChainWalk<'a> {
    graph: &'a DetailedGraph,
    catalog: &'a dyn Catalog,
    polymer_type: PolymerType,
    inline: &'a mut HashSet<EdgeId>,
    visited: HashSet<NodeId>,
    units: Vec<Unit>,
    emitted: Vec<NodeId>,
}

#[derive(Default)]
struct Unit {
    tokens: String,
    has_backbone: bool,
}

impl<'a> ChainWalk<'a> {
    fn new(
        graph: &'a DetailedGraph,
        catalog: &'a dyn Catalog,
        polymer_type: PolymerType,
        inline: &'a mut HashSet<EdgeId>,
    ) -> Self {
        Self {
            graph,
            catalog,
            polymer_type,
            inline,
            visited: HashSet::default(),
            units: Vec::new(),
            emitted: Vec::new(),
        }
    }

    fn run(
        mut self,
        polymer: PolymerId,
        start: Option<NodeId>,
    ) -> Result<(String, HashMap<NodeId, u32>)> {
        // NOTE: Anything left unreachable from the starting node is picked up afterwards, in position order
        let seeds: Vec<_> = start
            .into_iter()
            .chain(self.graph.polymer_nodes(polymer))
            .collect();
        for seed in seeds {
            if !self.visited.contains(&seed) {
                self.chain_from(seed)?;
            }
        }

        let body = self.units.iter().map(|unit| &unit.tokens).join(".");
        let positions = self.emitted.into_iter().zip(1..).collect();
        Ok((body, positions))
    }

    fn chain_from(&mut self, seed: NodeId) -> Result<()> {
        if self.graph.class(self.catalog, seed)?.is_branch() {
            let token = self.token(seed)?;
            self.emit(seed);
            self.units.push(Unit {
                tokens: format!("({token})"),
                has_backbone: false,
            });
            return Ok(());
        }

        let mut current = Some(seed);
        while let Some(node) = current {
            let token = self.token(node)?;
            if self.starts_unit(node)? {
                self.units.push(Unit::default());
            }
            self.emit(node);
            if let Some(unit) = self.units.last_mut() {
                unit.tokens.push_str(&token);
                unit.has_backbone = true;
            }

            if let Some(branch) = self.chain_successor(node, R3, MonomerClass::Branch)? {
                let token = self.token(branch)?;
                self.emit(branch);
                if let Some(unit) = self.units.last_mut() {
                    unit.tokens.push('(');
                    unit.tokens.push_str(&token);
                    unit.tokens.push(')');
                }
            }
            current = self.chain_successor(node, R2, MonomerClass::Backbone)?;
        }
        Ok(())
    }

    fn emit(&mut self, node: NodeId) {
        self.visited.insert(node);
        self.emitted.push(node);
    }

    // Nucleic acid units run from one sugar to the next, while every other monomer is a unit of its own
    fn starts_unit(&self, node: NodeId) -> Result<bool> {
        let Some(unit) = self.units.last() else {
            return Ok(true);
        };
        if self.polymer_type != PolymerType::NucleicAcid || !unit.has_backbone {
            return Ok(true);
        }
        let descriptor = self.graph.descriptor(self.catalog, node)?;
        Ok(descriptor.attachment_points.iter().any(|l| l == R3))
    }

    fn chain_successor(
        &mut self,
        node: NodeId,
        label: &str,
        class: MonomerClass,
    ) -> Result<Option<NodeId>> {
        for (edge, target) in self.graph.successors(node) {
            if self.visited.contains(&target) || !self.graph.is_chain_edge(self.catalog, edge)? {
                continue;
            }
            let from_label = self.graph.edge(edge).map(|e| e.source_label() == label);
            if from_label == Some(true) && self.graph.class(self.catalog, target)? == class {
                self.inline.insert(edge);
                return Ok(Some(target));
            }
        }
        Ok(None)
    }

    fn token(&self, node: NodeId) -> Result<String> {
        let monomer = self.graph.node(node)?.monomer();
        let descriptor = self.graph.resolve(self.catalog, monomer)?;
        let adhoc = self.graph.is_adhoc(monomer);
        let id = if adhoc {
            descriptor.smiles.as_deref().unwrap_or(&descriptor.id)
        } else {
            &descriptor.id
        };

        let single = id.len() == 1 && id.chars().all(|c| c.is_ascii_alphanumeric());
        let identifier = self.polymer_type.is_chemical() && !adhoc && is_identifier(id);
        Ok(if single || identifier {
            id.to_owned()
        } else {
            format!("[{id}]")
        })
    }
}

fn is_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
