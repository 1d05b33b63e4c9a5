mod attachment_state;
mod cycles;
mod edge_kind;

use petgraph::{Direction, visit::EdgeRef};
use tracing::debug;

use crate::{
    AttachmentState, Catalog, DetailedEdge, DetailedGraph, DetailedNode, EdgeId, EdgeKind,
    MonomerClass, MonomerDescriptor, MonomerRef, NodeId, PointState, PolymerId, PolymerType, R1,
    R2, R3, Result, Terminal, errors::PolygraphError,
};

/// One end of a prospective edge: a node and the label of one of its attachment points
pub type Endpoint<'l> = (NodeId, &'l str);

// Monomer References ==================================================================================================

impl MonomerRef {
    pub fn new(polymer_type: PolymerType, monomer_id: impl Into<String>) -> Self {
        let monomer_id = monomer_id.into();
        Self {
            polymer_type,
            monomer_id,
        }
    }

    #[must_use]
    pub const fn polymer_type(&self) -> PolymerType {
        self.polymer_type
    }

    #[must_use]
    pub fn monomer_id(&self) -> &str {
        &self.monomer_id
    }
}

// Nodes and Edges =====================================================================================================

impl DetailedNode {
    #[must_use]
    pub const fn monomer(&self) -> &MonomerRef {
        &self.monomer
    }

    #[must_use]
    pub const fn polymer(&self) -> PolymerId {
        self.polymer
    }

    /// The 1-based position of this monomer within its polymer, counted in notation order
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub const fn residue_number(&self) -> Option<u32> {
        self.residue_number
    }

    #[must_use]
    pub const fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    #[must_use]
    pub const fn attachments(&self) -> &AttachmentState {
        &self.attachments
    }

    pub fn set_residue_number(&mut self, residue_number: Option<u32>) {
        self.residue_number = residue_number;
    }

    pub fn set_terminal(&mut self, terminal: Option<Terminal>) {
        self.terminal = terminal;
    }
}

impl DetailedEdge {
    #[must_use]
    pub const fn kind(&self) -> EdgeKind {
        self.kind
    }

    #[must_use]
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    #[must_use]
    pub fn target_label(&self) -> &str {
        &self.target_label
    }
}

// Detailed Graph ======================================================================================================

impl DetailedGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Monomer Metadata ------------------------------------------------------------------------------------------------

    pub fn resolve<'s>(
        &'s self,
        catalog: &'s dyn Catalog,
        monomer: &MonomerRef,
    ) -> Result<&'s MonomerDescriptor> {
        self.adhoc.get(monomer).map_or_else(
            || catalog.lookup(monomer.polymer_type, &monomer.monomer_id),
            Ok,
        )
    }

    pub fn descriptor<'s>(
        &'s self,
        catalog: &'s dyn Catalog,
        node: NodeId,
    ) -> Result<&'s MonomerDescriptor> {
        self.resolve(catalog, &self.node(node)?.monomer)
    }

    pub fn class(&self, catalog: &dyn Catalog, node: NodeId) -> Result<MonomerClass> {
        Ok(self.descriptor(catalog, node)?.class)
    }

    /// Registers a monomer that isn't part of any catalog, returning a reference that resolves against this graph
    ///
    /// If a monomer with the same id was already registered for `polymer_type`, the existing descriptor is kept.
    pub fn register_adhoc(
        &mut self,
        polymer_type: PolymerType,
        descriptor: MonomerDescriptor,
    ) -> MonomerRef {
        let monomer = MonomerRef::new(polymer_type, descriptor.id.clone());
        self.adhoc.entry(monomer.clone()).or_insert(descriptor);
        monomer
    }

    #[must_use]
    pub fn is_adhoc(&self, monomer: &MonomerRef) -> bool {
        self.adhoc.contains_key(monomer)
    }

    // Nodes -----------------------------------------------------------------------------------------------------------

    pub fn add_monomer(
        &mut self,
        catalog: &dyn Catalog,
        monomer: MonomerRef,
        polymer: PolymerId,
        position: u32,
    ) -> Result<NodeId> {
        let descriptor = self.resolve(catalog, &monomer)?;
        let attachments = AttachmentState::new(monomer.polymer_type, descriptor);
        Ok(self.graph.add_node(DetailedNode {
            monomer,
            polymer,
            position,
            residue_number: None,
            terminal: None,
            attachments,
        }))
    }

    /// Removes a node and every edge touching it, freeing the attachment points those edges held on its neighbours
    pub fn remove_monomer(&mut self, node: NodeId) -> Result<DetailedNode> {
        let edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .chain(self.graph.edges_directed(node, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for edge in edges {
            self.disconnect(edge);
        }
        self.graph
            .remove_node(node)
            .ok_or_else(|| PolygraphError::node_lookup(node).into())
    }

    pub fn node(&self, node: NodeId) -> Result<&DetailedNode> {
        self.graph
            .node_weight(node)
            .ok_or_else(|| PolygraphError::node_lookup(node).into())
    }

    pub fn node_mut(&mut self, node: NodeId) -> Result<&mut DetailedNode> {
        self.graph
            .node_weight_mut(node)
            .ok_or_else(|| PolygraphError::node_lookup(node).into())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Every node of `polymer`, ordered by position
    #[must_use]
    pub fn polymer_nodes(&self, polymer: PolymerId) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self
            .graph
            .node_indices()
            .filter(|&n| self.graph[n].polymer == polymer)
            .collect();
        nodes.sort_by_key(|&n| (self.graph[n].position, n));
        nodes
    }

    #[must_use]
    pub fn find_position(&self, polymer: PolymerId, position: u32) -> Option<NodeId> {
        self.graph.node_indices().find(|&n| {
            let node = &self.graph[n];
            node.polymer == polymer && node.position == position
        })
    }

    // Edges -----------------------------------------------------------------------------------------------------------

    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&DetailedEdge> {
        self.graph.edge_weight(edge)
    }

    #[must_use]
    pub fn endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(edge)
    }

    /// Every edge in the graph, in index order
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph.edge_indices()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Non-pair edges leaving `node`, with their targets, in index order
    #[must_use]
    pub fn successors(&self, node: NodeId) -> Vec<(EdgeId, NodeId)> {
        self.adjacent(node, Direction::Outgoing)
    }

    /// Non-pair edges entering `node`, with their sources, in index order
    #[must_use]
    pub fn predecessors(&self, node: NodeId) -> Vec<(EdgeId, NodeId)> {
        self.adjacent(node, Direction::Incoming)
    }

    /// Non-pair edges touching `node` in either direction, with the node at their other end
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> Vec<(EdgeId, NodeId)> {
        let mut neighbors = self.successors(node);
        neighbors.extend(self.predecessors(node));
        neighbors.sort_unstable();
        neighbors
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    #[must_use]
    pub fn pair_partners(&self, node: NodeId) -> Vec<NodeId> {
        let mut partners: Vec<_> = [Direction::Outgoing, Direction::Incoming]
            .into_iter()
            .flat_map(|direction| self.graph.edges_directed(node, direction))
            .filter(|e| e.weight().kind.is_pair())
            .map(|e| (e.id(), if e.source() == node { e.target() } else { e.source() }))
            .collect();
        partners.sort_unstable();
        partners.into_iter().map(|(_, partner)| partner).collect()
    }

    /// Whether `edge` is part of a polymer's own chain, rather than a connection declared between monomers
    ///
    /// Chain edges run forwards within one polymer, either from one backbone unit's `R2` to the next unit's `R1`, or
    /// from a backbone unit's `R3` to the `R1` of the branch monomer hanging from it.
    pub fn is_chain_edge(&self, catalog: &dyn Catalog, edge: EdgeId) -> Result<bool> {
        let (Some(weight), Some((source, target))) = (self.edge(edge), self.endpoints(edge)) else {
            return Ok(false);
        };
        let (source_node, target_node) = (self.node(source)?, self.node(target)?);
        if !weight.kind.is_regular()
            || source_node.polymer != target_node.polymer
            || source_node.position >= target_node.position
            || weight.target_label != R1
        {
            return Ok(false);
        }

        let source_class = self.class(catalog, source)?;
        let target_class = self.class(catalog, target)?;
        Ok(match (weight.source_label.as_str(), source_class, target_class) {
            (R2, MonomerClass::Backbone, MonomerClass::Backbone) => true,
            (R3, MonomerClass::Backbone, MonomerClass::Branch) => true,
            _ => false,
        })
    }

    // Connections -----------------------------------------------------------------------------------------------------

    /// Connects two attachment points with a new edge, failing if either point is missing or already consumed
    pub fn connect(
        &mut self,
        catalog: &dyn Catalog,
        source: Endpoint,
        target: Endpoint,
    ) -> Result<EdgeId> {
        let kind = self.check_connection(catalog, source, target)?;
        Ok(self.add_edge(source, target, kind))
    }

    /// Connects two attachment points, silently skipping the connection if either point is already consumed
    ///
    /// When a non-pair edge would close a directed cycle in a graph that had no (undirected) cycles before it, the edge
    /// is inserted reversed, so that walking successor edges from any node stays acyclic. Returns the id of the
    /// inserted edge, or `None` if it was skipped.
    pub fn insert_connection(
        &mut self,
        catalog: &dyn Catalog,
        source: Endpoint,
        target: Endpoint,
    ) -> Result<Option<EdgeId>> {
        let kind = match self.check_connection(catalog, source, target) {
            Ok(kind) => kind,
            Err(error) if matches!(*error, PolygraphError::AttachmentConflict { .. }) => {
                debug!(%error, "skipping connection to an occupied attachment point");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        if kind.is_pair() {
            return Ok(Some(self.add_edge(source, target, kind)));
        }

        let was_cyclic = self.has_undirected_cycle();
        let edge = self.add_edge(source, target, kind);
        if !was_cyclic && self.has_directed_cycle() {
            self.disconnect(edge);
            debug!(
                source = source.0.index(),
                target = target.0.index(),
                "reversing a connection that would close a directed cycle"
            );
            return Ok(Some(self.add_edge(target, source, kind)));
        }

        Ok(Some(edge))
    }

    /// Removes an edge, freeing the attachment points it consumed
    pub fn disconnect(&mut self, edge: EdgeId) -> Option<DetailedEdge> {
        let (source, target) = self.graph.edge_endpoints(edge)?;
        let weight = self.graph.remove_edge(edge)?;
        self.graph[source]
            .attachments
            .set(&weight.source_label, PointState::Free);
        self.graph[target]
            .attachments
            .set(&weight.target_label, PointState::Free);
        Some(weight)
    }

    fn check_connection(
        &self,
        catalog: &dyn Catalog,
        (source, source_label): Endpoint,
        (target, target_label): Endpoint,
    ) -> Result<EdgeKind> {
        // Avoid partial updates by validating *both* attachment points before consuming either
        let source_node = self.node(source)?;
        let target_node = self.node(target)?;
        source_node
            .attachments
            .check_free(source_label, &source_node.monomer)?;
        target_node
            .attachments
            .check_free(target_label, &target_node.monomer)?;

        // A point can't be consumed by both ends of the same edge
        if source == target && source_label == target_label {
            let state = "claimed by the other end of this edge";
            return Err(
                PolygraphError::attachment_conflict(source_label, &source_node.monomer, state)
                    .into(),
            );
        }

        let source_class = self.class(catalog, source)?;
        let target_class = self.class(catalog, target)?;
        Ok(EdgeKind::derive(
            (source_class, source_label),
            (target_class, target_label),
        ))
    }

    // NOTE: Only call this once `check_connection()` has passed
    fn add_edge(
        &mut self,
        (source, source_label): Endpoint,
        (target, target_label): Endpoint,
        kind: EdgeKind,
    ) -> EdgeId {
        let edge = self.graph.add_edge(
            source,
            target,
            DetailedEdge {
                kind,
                source_label: source_label.to_owned(),
                target_label: target_label.to_owned(),
            },
        );
        self.graph[source]
            .attachments
            .set(source_label, PointState::Source(edge));
        self.graph[target]
            .attachments
            .set(target_label, PointState::Target(edge));
        edge
    }

    fn adjacent(&self, node: NodeId, direction: Direction) -> Vec<(EdgeId, NodeId)> {
        let mut adjacent: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .filter(|e| !e.weight().kind.is_pair())
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), other)
            })
            .collect();
        // NOTE: `petgraph` yields edges newest-first
        adjacent.sort_unstable();
        adjacent
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use crate::{MonomerDatabase, PAIR, manager::PolymerManager};

    use super::*;

    static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

    fn chain(
        graph: &mut DetailedGraph,
        polymer_type: PolymerType,
        polymer: PolymerId,
        ids: &[&str],
    ) -> Vec<NodeId> {
        let nodes: Vec<_> = ids
            .iter()
            .zip(1..)
            .map(|(id, position)| {
                let monomer = MonomerRef::new(polymer_type, *id);
                graph.add_monomer(&*DB, monomer, polymer, position).unwrap()
            })
            .collect();
        for pair in nodes.windows(2) {
            graph.connect(&*DB, (pair[0], R2), (pair[1], R1)).unwrap();
        }
        nodes
    }

    fn peptide(graph: &mut DetailedGraph, ids: &[&str]) -> Vec<NodeId> {
        let mut manager = PolymerManager::new();
        let polymer = manager.add_polymer(PolymerType::Peptide, "PEPTIDE");
        chain(graph, PolymerType::Peptide, polymer, ids)
    }

    #[test]
    fn add_monomers() {
        let mut graph = DetailedGraph::new();
        let polymer = PolymerManager::new().add_polymer(PolymerType::NucleicAcid, "RNA");
        let sugar = MonomerRef::new(PolymerType::NucleicAcid, "R");
        let node = graph.add_monomer(&*DB, sugar.clone(), polymer, 1).unwrap();

        let detailed = graph.node(node).unwrap();
        assert_eq!(detailed.monomer(), &sugar);
        assert_eq!(detailed.position(), 1);
        assert_eq!(detailed.attachments().free_labels().collect::<Vec<_>>(), [R1, R2, R3]);

        let missing = MonomerRef::new(PolymerType::NucleicAcid, "Q");
        let error = graph.add_monomer(&*DB, missing, polymer, 2).unwrap_err();
        assert!(matches!(*error, PolygraphError::MonomerLookup { .. }));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn connect_consumes_both_points() {
        let mut graph = DetailedGraph::new();
        let nodes = peptide(&mut graph, &["A", "G", "S"]);
        assert_eq!(graph.edge_count(), 2);

        let first = graph.node(nodes[0]).unwrap().attachments();
        assert!(first.is_free(R1));
        assert!(first.state(R2).unwrap().is_source());

        let middle = graph.node(nodes[1]).unwrap().attachments();
        assert!(middle.state(R1).unwrap().is_target());
        assert!(middle.state(R2).unwrap().is_source());

        let (edge, target) = graph.successors(nodes[0])[0];
        assert_eq!(target, nodes[1]);
        assert_eq!(graph.edge(edge).unwrap().kind(), EdgeKind::Regular);
        assert!(graph.is_chain_edge(&*DB, edge).unwrap());
    }

    #[test]
    fn connect_rejects_occupied_points() {
        let mut graph = DetailedGraph::new();
        let nodes = peptide(&mut graph, &["A", "G", "S"]);

        // `G` already has its R1 consumed by the chain
        let error = graph
            .connect(&*DB, (nodes[2], R2), (nodes[1], R1))
            .unwrap_err();
        assert!(matches!(*error, PolygraphError::AttachmentConflict { .. }));

        // Nothing was consumed on the free side either
        assert!(graph.node(nodes[2]).unwrap().attachments().is_free(R2));
        assert_eq!(graph.edge_count(), 2);

        let error = graph
            .connect(&*DB, (nodes[2], R2), (nodes[0], "R9"))
            .unwrap_err();
        assert!(matches!(*error, PolygraphError::AttachmentLookup { .. }));
    }

    #[test]
    fn insert_connection_skips_occupied_points() {
        let mut graph = DetailedGraph::new();
        let nodes = peptide(&mut graph, &["C", "G", "C"]);

        let bridge = graph
            .insert_connection(&*DB, (nodes[0], R3), (nodes[2], R3))
            .unwrap();
        assert!(bridge.is_some());
        assert_eq!(
            graph.edge(bridge.unwrap()).unwrap().kind(),
            EdgeKind::BranchToBranch
        );

        // The same connection again is dropped, not an error
        let duplicate = graph
            .insert_connection(&*DB, (nodes[0], R3), (nodes[2], R3))
            .unwrap();
        assert_eq!(duplicate, None);
        assert_eq!(graph.edge_count(), 3);

        // Undeclared points are still errors
        assert!(
            graph
                .insert_connection(&*DB, (nodes[1], R3), (nodes[2], R1))
                .is_err()
        );
    }

    #[test]
    fn insert_connection_reverses_closing_edges() {
        let mut graph = DetailedGraph::new();
        let nodes = peptide(&mut graph, &["A", "G", "S"]);

        // S:R2 -> A:R1 would close the ring A -> G -> S -> A
        let edge = graph
            .insert_connection(&*DB, (nodes[2], R2), (nodes[0], R1))
            .unwrap()
            .unwrap();
        assert_eq!(graph.endpoints(edge), Some((nodes[0], nodes[2])));

        let weight = graph.edge(edge).unwrap();
        assert_eq!(weight.source_label(), R1);
        assert_eq!(weight.target_label(), R2);
        assert!(!graph.is_chain_edge(&*DB, edge).unwrap());
        assert!(!graph.has_directed_cycle());
        assert!(graph.has_undirected_cycle());

        // The same points are consumed either way
        assert!(!graph.node(nodes[0]).unwrap().attachments().is_free(R1));
        assert!(!graph.node(nodes[2]).unwrap().attachments().is_free(R2));
    }

    #[test]
    fn insert_connection_keeps_direction_in_cyclic_graphs() {
        let mut graph = DetailedGraph::new();
        let nodes = peptide(&mut graph, &["C", "C", "K", "S"]);

        // A side-chain bridge makes the graph cyclic (undirected) without making it directed-cyclic
        graph
            .insert_connection(&*DB, (nodes[0], R3), (nodes[1], R3))
            .unwrap()
            .unwrap();
        assert!(graph.has_undirected_cycle());
        assert!(!graph.has_directed_cycle());

        // Closing the backbone ring is now inserted as written
        let edge = graph
            .insert_connection(&*DB, (nodes[3], R2), (nodes[0], R1))
            .unwrap()
            .unwrap();
        assert_eq!(graph.endpoints(edge), Some((nodes[3], nodes[0])));
        assert!(graph.has_directed_cycle());
    }

    #[test]
    fn pairs_are_not_adjacency() {
        let mut graph = DetailedGraph::new();
        let mut manager = PolymerManager::new();
        let sense = manager.add_polymer(PolymerType::NucleicAcid, "RNA");
        let antisense = manager.add_polymer(PolymerType::NucleicAcid, "RNA");
        let base = |graph: &mut DetailedGraph, id: &str, polymer| {
            let monomer = MonomerRef::new(PolymerType::NucleicAcid, id);
            graph.add_monomer(&*DB, monomer, polymer, 1).unwrap()
        };
        let a = base(&mut graph, "A", sense);
        let u = base(&mut graph, "U", antisense);

        let edge = graph
            .insert_connection(&*DB, (a, PAIR), (u, PAIR))
            .unwrap()
            .unwrap();
        assert_eq!(graph.edge(edge).unwrap().kind(), EdgeKind::Pair);
        assert_eq!(graph.pair_partners(a), [u]);
        assert_eq!(graph.pair_partners(u), [a]);
        assert!(graph.successors(a).is_empty());
        assert_eq!(graph.degree(u), 0);
    }

    #[test]
    fn disconnect_and_remove_free_points() {
        let mut graph = DetailedGraph::new();
        let nodes = peptide(&mut graph, &["A", "G", "S"]);

        let (edge, _) = graph.successors(nodes[0])[0];
        let removed = graph.disconnect(edge).unwrap();
        assert_eq!(removed.source_label(), R2);
        assert!(graph.node(nodes[0]).unwrap().attachments().is_free(R2));
        assert!(graph.node(nodes[1]).unwrap().attachments().is_free(R1));
        assert_eq!(graph.disconnect(edge), None);

        graph.remove_monomer(nodes[2]).unwrap();
        assert!(graph.node(nodes[1]).unwrap().attachments().is_free(R2));
        assert_eq!(graph.edge_count(), 0);
        assert!(matches!(
            *graph.node(nodes[2]).unwrap_err(),
            PolygraphError::NodeLookup(_)
        ));
    }

    #[test]
    fn adhoc_monomers_resolve_locally() {
        let mut graph = DetailedGraph::new();
        let polymer = PolymerManager::new().add_polymer(PolymerType::Chemical, "CHEM");
        let descriptor = MonomerDescriptor {
            id: "[*:1]CCO[*:2]".to_owned(),
            name: "[*:1]CCO[*:2]".to_owned(),
            natural_analog: "X".to_owned(),
            class: MonomerClass::Chemical,
            attachment_points: vec![R1.to_owned(), R2.to_owned()],
            is_modified: true,
            smiles: Some("[*:1]CCO[*:2]".to_owned()),
        };
        let monomer = graph.register_adhoc(PolymerType::Chemical, descriptor);
        assert!(graph.is_adhoc(&monomer));
        assert!(DB.lookup(PolymerType::Chemical, monomer.monomer_id()).is_err());

        let node = graph.add_monomer(&*DB, monomer, polymer, 1).unwrap();
        assert_eq!(graph.class(&*DB, node).unwrap(), MonomerClass::Chemical);
        assert_eq!(graph.polymer_nodes(polymer), [node]);
        assert_eq!(graph.find_position(polymer, 1), Some(node));
        assert_eq!(graph.find_position(polymer, 2), None);
    }
}
