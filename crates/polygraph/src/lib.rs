//! A graph model of macromolecules assembled from catalogued monomers

pub mod catalog;
pub mod errors;
pub mod graph;
pub mod manager;
pub mod traversal;
#[cfg(test)]
mod testing_tools;

use derive_more::{Display, IsVariant};
use serde::Serialize;

// External Crate Imports
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};

pub use catalog::{Catalog, CatalogHandle, CatalogSnapshot, monomer_database::MonomerDatabase};
pub use errors::{PolygraphError, Result};
pub use manager::PolymerManager;

// NOTE: `petgraph` indices are only meaningful for the graph that issued them. A `StableGraph` keeps them valid across
// removals, but may hand a vacated index out again to the next node or edge it creates
pub type NodeId = NodeIndex;
pub type EdgeId = EdgeIndex;

// Monomers ============================================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, IsVariant, Serialize)]
pub enum PolymerType {
    #[display("nucleic acid")]
    NucleicAcid,
    #[display("peptide")]
    Peptide,
    #[display("chemical")]
    Chemical,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, IsVariant, Serialize)]
pub enum MonomerClass {
    #[display("backbone")]
    Backbone,
    #[display("branch")]
    Branch,
    #[display("chemical")]
    Chemical,
}

/// A reference to a catalog entry, resolved against a [`Catalog`] whenever its metadata is needed
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
#[display("{monomer_id} ({polymer_type})")]
pub struct MonomerRef {
    polymer_type: PolymerType,
    monomer_id: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct MonomerDescriptor {
    pub id: String,
    pub name: String,
    pub natural_analog: String,
    pub class: MonomerClass,
    pub attachment_points: Vec<String>,
    pub is_modified: bool,
    pub smiles: Option<String>,
}

// Attachment Points ===================================================================================================

/// Receives the preceding backbone unit, or the backbone unit a branch hangs from
pub const R1: &str = "R1";
/// Connects to the following backbone unit
pub const R2: &str = "R2";
/// Connects to a branch monomer or, on peptides, to another side chain
pub const R3: &str = "R3";
/// Implicitly declared by every nucleic acid branch monomer for base pairing
pub const PAIR: &str = "pair";

/// Tracks which of a monomer's attachment points have been consumed, and by which edge
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AttachmentState {
    points: Vec<(String, PointState)>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, IsVariant)]
pub enum PointState {
    #[default]
    Free,
    Source(EdgeId),
    Target(EdgeId),
}

// Detailed Graph ======================================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
pub struct PolymerId(usize);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, IsVariant, Serialize)]
pub enum Terminal {
    #[display("5'")]
    FivePrime,
    #[display("3'")]
    ThreePrime,
    #[display("N")]
    NTerminal,
    #[display("C")]
    CTerminal,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DetailedNode {
    monomer: MonomerRef,
    polymer: PolymerId,
    position: u32,
    residue_number: Option<u32>,
    terminal: Option<Terminal>,
    attachments: AttachmentState,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, IsVariant, Serialize)]
pub enum EdgeKind {
    Regular,
    Pair,
    BranchToBackbone,
    BranchToBranch,
    Chemical,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DetailedEdge {
    kind: EdgeKind,
    source_label: String,
    target_label: String,
}

/// Every monomer instance of a document, wired together through their attachment points
#[derive(Clone, Debug, Default)]
pub struct DetailedGraph {
    graph: StableDiGraph<DetailedNode, DetailedEdge>,
    // NOTE: Ad-hoc monomers aren't part of any catalog, so their descriptors live alongside the graph that uses them
    adhoc: ahash::HashMap<MonomerRef, MonomerDescriptor>,
}
