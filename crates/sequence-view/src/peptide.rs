use polygraph::{Catalog, DetailedGraph, NodeId, PolymerId, R2};

use crate::{Result, ViewGraph, copy_edges, display_text, is_member};

/// Gives every residue a view node of its own, in chain order from `start`
///
/// Residues that the chain doesn't reach (after an edit has cut it, say) follow in position order. Every edge between
/// two residues is copied over, so side-chain bridges and the closing bond of a cyclic peptide survive.
pub(crate) fn build_view_sequence(
    graph: &DetailedGraph,
    catalog: &dyn Catalog,
    start: NodeId,
    view: &mut ViewGraph,
) -> Result<()> {
    let polymer = view.polymer();
    let mut current = Some(start);
    while let Some(node) = current {
        // Cyclic peptides eventually lead back to a residue that's already been seen
        if view.view_of(node).is_some() {
            break;
        }
        view.push_node(display_text(graph, catalog, node)?, vec![node]);
        current = next_residue(graph, polymer, node);
    }

    for node in graph.polymer_nodes(polymer) {
        if view.view_of(node).is_none() {
            view.push_node(display_text(graph, catalog, node)?, vec![node]);
        }
    }

    copy_edges(graph, view);
    Ok(())
}

fn next_residue(graph: &DetailedGraph, polymer: PolymerId, node: NodeId) -> Option<NodeId> {
    graph.successors(node).into_iter().find_map(|(edge, target)| {
        let leaves_r2 = graph.edge(edge).is_some_and(|edge| edge.source_label() == R2);
        (leaves_r2 && is_member(graph, polymer, target)).then_some(target)
    })
}
