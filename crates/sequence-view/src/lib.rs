//! Collapses a [`DetailedGraph`] into a compact view graph, with one node per rendered residue
//!
//! Nucleic acids fold each sugar, base, and phosphate into a single view node (labelled with any phosphates left
//! hanging off of it), peptide residues map onto view nodes one-to-one, and chemical modifiers become a single view
//! node each. Views are cheap to rebuild and should be thrown away whenever the detailed graph changes.

mod chemical;
mod labels;
mod nucleic_acid;
mod peptide;

use std::fmt::{self, Display, Formatter};

use ahash::HashMap;
use itertools::Itertools;
use miette::Diagnostic;
use polygraph::{
    Catalog, DetailedGraph, EdgeKind, NodeId, PolygraphError, PolymerId, PolymerManager,
    PolymerType, Terminal,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub type Result<T, E = Box<ReductionFailure>> = std::result::Result<T, E>;

/// An index into the nodes of a single [`ViewGraph`]
pub type ViewId = usize;

// Errors ==============================================================================================================

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum ReductionFailure {
    #[error("node {0:?} is not the starting node of any polymer")]
    #[diagnostic(help("views are built from the starting nodes recorded by the polymer manager"))]
    NotAStartingNode(NodeId),

    #[error("the walk from node {0:?} didn't reach any residues")]
    EmptyView(NodeId),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] Box<PolygraphError>),
}

impl From<Box<PolygraphError>> for Box<ReductionFailure> {
    fn from(value: Box<PolygraphError>) -> Self {
        Self::new(ReductionFailure::Graph(value))
    }
}

// View Graph ==========================================================================================================

/// Everything the rendering layer needs to annotate a view node
///
/// A lone nucleotide with a linker on either side carries a single `b<left>_<right>` label in
/// [`LabelInfo::combined_linker`], and leaves both [`LabelInfo::left_linker`] and [`LabelInfo::right_linker`] empty.
/// Every other view node uses the two side labels, and never the combined one.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct LabelInfo {
    pub position_number: Option<u32>,
    pub terminal_label: Option<Terminal>,
    /// A linker (like a phosphate) dangling from the start of this residue
    pub left_linker: Option<String>,
    /// A linker dangling from the end of this residue
    pub right_linker: Option<String>,
    /// Replaces both linker labels when a lone residue has a linker on either side, like `bP_P`
    pub combined_linker: Option<String>,
    pub flipped: bool,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ViewNode {
    text: String,
    backing: Vec<NodeId>,
    label: LabelInfo,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ViewEdge {
    pub source: ViewId,
    pub target: ViewId,
    pub kind: EdgeKind,
}

/// The reduced form of a single polymer
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ViewGraph {
    polymer: PolymerId,
    polymer_type: PolymerType,
    nodes: Vec<ViewNode>,
    edges: Vec<ViewEdge>,
    index: HashMap<NodeId, ViewId>,
    docks: Vec<(ViewId, NodeId)>,
}

impl ViewNode {
    /// The one-letter (or natural analog) text shown for this node, or `X` when there's nothing to show
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The detailed nodes summarized by this view node
    #[must_use]
    pub fn backing(&self) -> &[NodeId] {
        &self.backing
    }

    #[must_use]
    pub const fn label(&self) -> &LabelInfo {
        &self.label
    }

    /// Placeholders stand in for a residue whose sugar and base have both been deleted
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.backing.is_empty()
    }
}

impl ViewGraph {
    fn new(polymer: PolymerId, polymer_type: PolymerType) -> Self {
        Self {
            polymer,
            polymer_type,
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::default(),
            docks: Vec::new(),
        }
    }

    #[must_use]
    pub const fn polymer(&self) -> PolymerId {
        self.polymer
    }

    #[must_use]
    pub const fn polymer_type(&self) -> PolymerType {
        self.polymer_type
    }

    #[must_use]
    pub fn nodes(&self) -> &[ViewNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: ViewId) -> Option<&ViewNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn edges(&self) -> &[ViewEdge] {
        &self.edges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The view node summarizing the detailed `node`, if any
    #[must_use]
    pub fn view_of(&self, node: NodeId) -> Option<ViewId> {
        self.index.get(&node).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelInfo> {
        self.nodes.iter().map(ViewNode::label)
    }

    /// Connections from a view node to detailed nodes belonging to other polymers
    #[must_use]
    pub fn docks(&self) -> &[(ViewId, NodeId)] {
        &self.docks
    }

    /// The text of every view node, in order, like `AGC`
    #[must_use]
    pub fn sequence(&self) -> String {
        self.nodes.iter().map(ViewNode::text).collect()
    }

    fn push_node(&mut self, text: impl Into<String>, backing: Vec<NodeId>) -> ViewId {
        let id = self.nodes.len();
        for &node in &backing {
            self.index.insert(node, id);
        }
        self.nodes.push(ViewNode {
            text: text.into(),
            backing,
            label: LabelInfo::default(),
        });
        id
    }

    fn push_edge(&mut self, source: ViewId, target: ViewId, kind: EdgeKind) {
        self.edges.push(ViewEdge {
            source,
            target,
            kind,
        });
    }

    // Folds another detailed node into an existing view node
    fn attach(&mut self, id: ViewId, node: NodeId) {
        if let Some(view_node) = self.nodes.get_mut(id) {
            view_node.backing.push(node);
            self.index.insert(node, id);
        }
    }

    fn label_mut(&mut self, id: ViewId) -> Option<&mut LabelInfo> {
        self.nodes.get_mut(id).map(|node| &mut node.label)
    }

    fn find_docks(&mut self, graph: &DetailedGraph) -> Result<()> {
        let mut docks = Vec::new();
        for (id, view_node) in self.nodes.iter().enumerate() {
            for &node in &view_node.backing {
                for (_, neighbor) in graph.neighbors(node) {
                    if graph.node(neighbor)?.polymer() != self.polymer {
                        docks.push((id, neighbor));
                    }
                }
            }
        }
        self.docks = docks.into_iter().unique().collect();
        Ok(())
    }
}

impl Display for ViewGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        for (id, ViewNode { text, label, .. }) in self.nodes.iter().enumerate() {
            let annotations = [
                label.position_number.map(|n| n.to_string()),
                label.terminal_label.map(|t| t.to_string()),
                label.left_linker.as_ref().map(|l| format!("{l}-")),
                label.right_linker.as_ref().map(|l| format!("-{l}")),
                label.combined_linker.clone(),
            ]
            .into_iter()
            .flatten()
            .join(", ");
            writeln!(f, r#"  {id} [label="{text}\n[{annotations}]"]"#)?;
        }
        for ViewEdge {
            source,
            target,
            kind,
        } in &self.edges
        {
            writeln!(f, r#"  {source} -> {target} [label="{kind}"]"#)?;
        }
        writeln!(f, "}}")?;
        Ok(())
    }
}

// Reduction ===========================================================================================================

/// Builds views against a particular monomer catalog
#[derive(Copy, Clone)]
pub struct Reducer<'c> {
    catalog: &'c dyn Catalog,
}

impl<'c> Reducer<'c> {
    #[must_use]
    pub const fn new(catalog: &'c dyn Catalog) -> Self {
        Self { catalog }
    }

    /// Reduces the polymer starting at `start`, or returns `None` (and logs why) if it couldn't be reduced
    ///
    /// A polymer that fails to reduce never takes the rest of the document down with it: see
    /// [`Reducer::reduce_document`].
    #[must_use]
    pub fn reduce(
        &self,
        graph: &DetailedGraph,
        manager: &PolymerManager,
        start: NodeId,
    ) -> Option<ViewGraph> {
        match self.try_reduce(graph, manager, start) {
            Ok(view) => Some(view),
            Err(error) => {
                warn!(?start, %error, "failed to reduce polymer");
                None
            }
        }
    }

    #[instrument(skip(self, graph, manager))]
    pub fn try_reduce(
        &self,
        graph: &DetailedGraph,
        manager: &PolymerManager,
        start: NodeId,
    ) -> Result<ViewGraph> {
        let polymer = manager
            .polymer_starting_at(start)
            .ok_or(ReductionFailure::NotAStartingNode(start))?;
        let polymer_type = graph.node(start)?.monomer().polymer_type();

        let catalog = self.catalog;
        let mut view = ViewGraph::new(polymer, polymer_type);
        match polymer_type {
            PolymerType::NucleicAcid => nucleic_acid::build_view_sequence(graph, catalog, start, &mut view),
            PolymerType::Peptide => peptide::build_view_sequence(graph, catalog, start, &mut view),
            PolymerType::Chemical => chemical::build_view_sequence(graph, catalog, start, &mut view),
        }?;
        if view.is_empty() {
            return Err(ReductionFailure::EmptyView(start).into());
        }

        labels::fill_label_maps(graph, &mut view, manager.is_flipped(polymer))?;
        view.find_docks(graph)?;
        debug!(sequence = view.sequence(), "reduced polymer");
        Ok(view)
    }

    /// Reduces every polymer of `manager`, in order
    pub fn reduce_document(
        &self,
        graph: &DetailedGraph,
        manager: &PolymerManager,
    ) -> Vec<(PolymerId, Option<ViewGraph>)> {
        manager
            .order()
            .iter()
            .map(|&polymer| {
                let view = manager
                    .starting_node(polymer)
                    .and_then(|start| self.reduce(graph, manager, start));
                (polymer, view)
            })
            .collect()
    }
}

// Shared Helpers ======================================================================================================

// The natural analog of a monomer is what gets shown, so `dA` and `[5meC]` read as `A` and `C`
fn display_text(graph: &DetailedGraph, catalog: &dyn Catalog, node: NodeId) -> Result<String> {
    Ok(graph.descriptor(catalog, node)?.natural_analog.clone())
}

fn is_member(graph: &DetailedGraph, polymer: PolymerId, node: NodeId) -> bool {
    graph.node(node).is_ok_and(|n| n.polymer() == polymer)
}

// Copies every non-pair edge whose ends have both been mapped onto view nodes
fn copy_edges(graph: &DetailedGraph, view: &mut ViewGraph) {
    for edge in graph.edge_ids() {
        let (Some(weight), Some((source, target))) = (graph.edge(edge), graph.endpoints(edge)) else {
            continue;
        };
        if weight.kind().is_pair() {
            continue;
        }
        if let (Some(source), Some(target)) = (view.view_of(source), view.view_of(target)) {
            view.push_edge(source, target, weight.kind());
        }
    }
}
