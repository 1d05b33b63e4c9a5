use polygraph::DetailedGraph;

use crate::{Result, ViewGraph};

/// Copies residue numbers and terminal labels from the detailed nodes backing each view node
///
/// For nucleic acids, residue numbers come from the base and terminal labels from the sugar; for peptides, both come
/// from the same residue. The first backing node to declare either one wins.
pub(crate) fn fill_label_maps(
    graph: &DetailedGraph,
    view: &mut ViewGraph,
    flipped: bool,
) -> Result<()> {
    for view_node in &mut view.nodes {
        let label = &mut view_node.label;
        for &node in &view_node.backing {
            let node = graph.node(node)?;
            label.position_number = label.position_number.or(node.residue_number());
            label.terminal_label = label.terminal_label.or(node.terminal());
        }
        label.flipped = flipped;
    }
    Ok(())
}
