use std::collections::VecDeque;

use ahash::HashSet;

use crate::{DetailedGraph, NodeId};

/// A breadth-first walk over the connected region of a [`DetailedGraph`] that satisfies a predicate
///
/// Edges are followed in both directions, but pair edges are never crossed. Whenever the walk reaches a neighbour
/// that fails the predicate, that neighbour is recorded as a dock: a boundary between the region and the rest of the
/// graph.
pub struct ComponentIter<'g> {
    graph: &'g DetailedGraph,
    start: Option<NodeId>,
    queue: VecDeque<NodeId>,
    visited: HashSet<NodeId>,
    is_ok: Box<dyn Fn(NodeId) -> bool + 'g>,
    on_dock: Option<Box<dyn FnMut(NodeId, NodeId) + 'g>>,
    docks: Vec<(NodeId, NodeId)>,
}

impl<'g> ComponentIter<'g> {
    pub fn new(
        graph: &'g DetailedGraph,
        start: NodeId,
        is_ok: impl Fn(NodeId) -> bool + 'g,
    ) -> Self {
        Self {
            graph,
            start: Some(start),
            queue: VecDeque::new(),
            visited: HashSet::default(),
            is_ok: Box::new(is_ok),
            on_dock: None,
            docks: Vec::new(),
        }
    }

    /// Calls `hook` with `(inside, outside)` the first time each dock is found
    #[must_use]
    pub fn on_dock(mut self, hook: impl FnMut(NodeId, NodeId) + 'g) -> Self {
        self.on_dock = Some(Box::new(hook));
        self
    }

    /// Every `(inside, outside)` dock found so far
    #[must_use]
    pub fn docks(&self) -> &[(NodeId, NodeId)] {
        &self.docks
    }

    fn dock(&mut self, inside: NodeId, outside: NodeId) {
        if self.docks.contains(&(inside, outside)) {
            return;
        }
        self.docks.push((inside, outside));
        if let Some(hook) = &mut self.on_dock {
            hook(inside, outside);
        }
    }
}

impl Iterator for ComponentIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            if self.graph.node(start).is_ok() && (self.is_ok)(start) {
                self.visited.insert(start);
                self.queue.push_back(start);
            }
        }

        let node = self.queue.pop_front()?;
        for (_, neighbor) in self.graph.neighbors(node) {
            if self.visited.contains(&neighbor) {
                continue;
            }
            if (self.is_ok)(neighbor) {
                self.visited.insert(neighbor);
                self.queue.push_back(neighbor);
            } else {
                self.dock(node, neighbor);
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use crate::{MonomerDatabase, MonomerRef, PolymerManager, PolymerType, R1, R2, R3};

    use super::*;

    static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

    // A four residue peptide, with a PEG2 linker hanging from the side chain of its cysteine
    fn peptide_with_linker() -> (DetailedGraph, Vec<NodeId>, NodeId) {
        let mut graph = DetailedGraph::new();
        let mut manager = PolymerManager::new();
        let peptide = manager.add_polymer(PolymerType::Peptide, "PEPTIDE");
        let chem = manager.add_polymer(PolymerType::Chemical, "CHEM");

        let residues: Vec<_> = ["A", "C", "G", "K"]
            .into_iter()
            .zip(1..)
            .map(|(id, position)| {
                let monomer = MonomerRef::new(PolymerType::Peptide, id);
                graph.add_monomer(&*DB, monomer, peptide, position).unwrap()
            })
            .collect();
        for pair in residues.windows(2) {
            graph.connect(&*DB, (pair[0], R2), (pair[1], R1)).unwrap();
        }

        let peg = MonomerRef::new(PolymerType::Chemical, "PEG2");
        let linker = graph.add_monomer(&*DB, peg, chem, 1).unwrap();
        graph.connect(&*DB, (residues[1], R3), (linker, R1)).unwrap();

        (graph, residues, linker)
    }

    #[test]
    fn walks_the_whole_component() {
        let (graph, residues, linker) = peptide_with_linker();
        let mut walk: Vec<_> = ComponentIter::new(&graph, residues[2], |_| true).collect();
        walk.sort_unstable();
        let mut expected = residues.clone();
        expected.push(linker);
        assert_eq!(walk, expected);
    }

    #[test]
    fn records_docks_at_the_boundary() {
        let (graph, residues, linker) = peptide_with_linker();
        let peptide = graph.node(residues[0]).unwrap().polymer();
        let is_peptide = |n| graph.node(n).is_ok_and(|node| node.polymer() == peptide);

        let mut hooked = Vec::new();
        let mut walk = ComponentIter::new(&graph, residues[0], is_peptide)
            .on_dock(|inside, outside| hooked.push((inside, outside)));
        // Breadth-first from the first residue follows the chain in order
        assert_eq!(walk.by_ref().collect::<Vec<_>>(), residues);
        assert_eq!(walk.docks(), [(residues[1], linker)]);
        drop(walk);
        assert_eq!(hooked, [(residues[1], linker)]);
    }

    #[test]
    fn rejected_start_yields_nothing() {
        let (graph, residues, linker) = peptide_with_linker();
        let mut walk = ComponentIter::new(&graph, residues[0], move |n| n == linker);
        assert_eq!(walk.next(), None);
        assert!(walk.docks().is_empty());

        let mut missing = ComponentIter::new(&graph, NodeId::new(99), |_| true);
        assert_eq!(missing.next(), None);
    }
}
