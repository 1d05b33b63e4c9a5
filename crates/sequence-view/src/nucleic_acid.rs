use std::mem;

use polygraph::{
    Catalog, DetailedGraph, EdgeId, EdgeKind, NodeId,
    traversal::{SenseIter, by_priority},
};
use tracing::debug;

use crate::{Result, ViewGraph, ViewId, display_text, is_member};

/// Shown in place of a residue that's missing its base
const PLACEHOLDER: &str = "X";

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Side {
    Left,
    Right,
}

/// Folds each run of sugars and bases between two linkers into a single view node
///
/// The chain is walked from `start` in its sense direction, with branches visited before the linker that continues
/// the backbone. Every linker closes the run before it, and two bonded linkers in a row leave a placeholder between
/// them. Once the walk is done, each linker is folded into a neighbouring view node and labels it.
pub(crate) fn build_view_sequence(
    graph: &DetailedGraph,
    catalog: &dyn Catalog,
    start: NodeId,
    view: &mut ViewGraph,
) -> Result<()> {
    let polymer = view.polymer();
    let is_linker = move |node: NodeId| graph.is_linker(catalog, node).unwrap_or(false);
    let walk = SenseIter::new(graph, start)
        .admit(move |node| is_member(graph, polymer, node))
        .order_by(by_priority(graph, catalog))
        .one_linker_in_flight(is_linker);

    let mut run = Vec::new();
    let mut linkers = Vec::new();
    for node in walk {
        if !is_linker(node) {
            run.push(node);
            continue;
        }

        // A leading linker has nothing before it to close off
        let bonded_to_last = linkers.last().is_some_and(|&last| bonded(graph, last, node));
        if !run.is_empty() || bonded_to_last {
            flush(graph, catalog, view, &mut run)?;
        }
        linkers.push(node);
    }
    if !run.is_empty() {
        flush(graph, catalog, view, &mut run)?;
    }

    label_linkers(graph, view, &linkers)
}

fn flush(
    graph: &DetailedGraph,
    catalog: &dyn Catalog,
    view: &mut ViewGraph,
    run: &mut Vec<NodeId>,
) -> Result<()> {
    let backing = mem::take(run);
    let mut text = None;
    for &node in &backing {
        if graph.class(catalog, node)?.is_branch() {
            text = Some(display_text(graph, catalog, node)?);
            break;
        }
    }

    let previous = view.len().checked_sub(1);
    let id = view.push_node(text.as_deref().unwrap_or(PLACEHOLDER), backing);
    if let Some(previous) = previous {
        view.push_edge(previous, id, EdgeKind::Regular);
    }
    Ok(())
}

fn label_linkers(graph: &DetailedGraph, view: &mut ViewGraph, linkers: &[NodeId]) -> Result<()> {
    let monomer_id = |node: NodeId| -> Result<String> {
        Ok(graph.node(node)?.monomer().monomer_id().to_owned())
    };

    // A lone residue between two linkers gets a single label naming both
    if let (&[left, right], 1) = (linkers, view.len()) {
        let combined = format!("b{}_{}", monomer_id(left)?, monomer_id(right)?);
        view.attach(0, left);
        view.attach(0, right);
        if let Some(label) = view.label_mut(0) {
            label.combined_linker = Some(combined);
        }
        return Ok(());
    }

    for &linker in linkers {
        let Some((id, side)) = neighbour(view, graph.successors(linker))
            .map(|id| (id, Side::Left))
            .or_else(|| neighbour(view, graph.predecessors(linker)).map(|id| (id, Side::Right)))
        else {
            debug!(?linker, "linker isn't next to any residue");
            continue;
        };
        view.attach(id, linker);

        // Linkers bridging more than two neighbours are drawn inline, not as a label
        if graph.degree(linker) > 2 {
            continue;
        }
        let text = monomer_id(linker)?;
        if let Some(label) = view.label_mut(id) {
            match side {
                Side::Left => label.left_linker = Some(text),
                Side::Right => label.right_linker = Some(text),
            }
        }
    }
    Ok(())
}

fn bonded(graph: &DetailedGraph, a: NodeId, b: NodeId) -> bool {
    graph.neighbors(a).into_iter().any(|(_, node)| node == b)
}

fn neighbour(view: &ViewGraph, adjacent: Vec<(EdgeId, NodeId)>) -> Option<ViewId> {
    adjacent.into_iter().find_map(|(_, node)| view.view_of(node))
}
