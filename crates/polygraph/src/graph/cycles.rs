use petgraph::{
    unionfind::UnionFind,
    visit::{EdgeRef, IntoEdgeReferences, NodeIndexable},
};

use crate::DetailedGraph;

#[derive(Copy, Clone, Eq, PartialEq)]
enum Mark {
    Unseen,
    OnPath,
    Finished,
}

// NOTE: Pair edges are never considered here. They join strands, but don't contribute to either strand's topology
impl DetailedGraph {
    /// Whether the non-pair edges of this graph, ignoring direction, contain a cycle
    ///
    /// Parallel edges between the same two nodes count as a cycle.
    #[must_use]
    pub fn has_undirected_cycle(&self) -> bool {
        let mut components = UnionFind::<usize>::new(self.graph.node_bound());
        self.graph
            .edge_references()
            .filter(|e| !e.weight().kind.is_pair())
            .any(|e| !components.union(e.source().index(), e.target().index()))
    }

    /// Whether following non-pair edges from source to target can ever lead back to where it started
    #[must_use]
    pub fn has_directed_cycle(&self) -> bool {
        let mut marks = vec![Mark::Unseen; self.graph.node_bound()];

        for root in self.graph.node_indices() {
            if marks[root.index()] != Mark::Unseen {
                continue;
            }

            marks[root.index()] = Mark::OnPath;
            let mut path = vec![(root, self.successors(root).into_iter())];
            while let Some((node, successors)) = path.last_mut() {
                let node = *node;
                match successors.next() {
                    Some((_, next)) => match marks[next.index()] {
                        Mark::OnPath => return true,
                        Mark::Finished => (),
                        Mark::Unseen => {
                            marks[next.index()] = Mark::OnPath;
                            path.push((next, self.successors(next).into_iter()));
                        }
                    },
                    None => {
                        marks[node.index()] = Mark::Finished;
                        path.pop();
                    }
                }
            }
        }

        false
    }
}
