use polygraph::{Catalog, DetailedGraph, NodeId, traversal::ComponentIter};

use crate::{Result, ViewGraph, copy_edges, display_text, is_member};

pub(crate) fn build_view_sequence(
    graph: &DetailedGraph,
    catalog: &dyn Catalog,
    start: NodeId,
    view: &mut ViewGraph,
) -> Result<()> {
    let polymer = view.polymer();
    let members: Vec<_> =
        ComponentIter::new(graph, start, move |node| is_member(graph, polymer, node)).collect();
    for node in members {
        view.push_node(display_text(graph, catalog, node)?, vec![node]);
    }

    copy_edges(graph, view);
    Ok(())
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;
    use polygraph::{MonomerDatabase, PolymerType};

    use super::*;

    static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

    #[test]
    fn chemicals_stay_whole() {
        let notation = "RNA1{R(A)P}|CHEM1{SMCC}|CHEM2{[[*:1]OCC[*:2]]}$RNA1,CHEM1,3:R2-1:R1$$$";
        let document = notation::decode(notation, &*DB).unwrap();
        let (graph, manager) = (document.graph(), document.manager());

        let texts: Vec<_> = manager.order()[1..]
            .iter()
            .map(|&polymer| {
                let start = manager.starting_node(polymer).unwrap();
                let mut view = ViewGraph::new(polymer, PolymerType::Chemical);
                build_view_sequence(graph, &*DB, start, &mut view).unwrap();
                assert_eq!(view.nodes()[0].backing(), [start]);
                // The connection to the RNA leaves the polymer, so it isn't part of the view
                assert!(view.edges().is_empty());
                view.sequence()
            })
            .collect();
        assert_eq!(texts, ["SMCC", "X"]);
    }
}
