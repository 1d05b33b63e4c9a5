use miette::Diagnostic;
use thiserror::Error;

use std::fmt::Display;

use crate::{MonomerRef, NodeId, PolymerType};

pub type Result<T, E = Box<PolygraphError>> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum PolygraphError {
    #[error("the {polymer_type} monomer {id:?} could not be found in the supplied monomer catalog")]
    #[diagnostic(help("double-check for typos, or add {id:?} to the monomer catalog"))]
    MonomerLookup {
        polymer_type: PolymerType,
        id: String,
    },

    #[error("the attachment point {label:?} is not declared by the monomer {monomer}")]
    AttachmentLookup { label: String, monomer: MonomerRef },

    #[error("the attachment point {label:?} of the monomer {monomer} is already {state}, but must be free")]
    AttachmentConflict {
        label: String,
        monomer: MonomerRef,
        state: String,
    },

    #[error("node {0:?} does not belong to this graph")]
    #[diagnostic(help("the node was likely removed, or was created by a different graph"))]
    NodeLookup(NodeId),
}

impl PolygraphError {
    pub(crate) fn monomer_lookup(polymer_type: PolymerType, id: &str) -> Self {
        let id = id.to_owned();

        Self::MonomerLookup { polymer_type, id }
    }

    pub(crate) fn attachment_lookup(label: &str, monomer: &MonomerRef) -> Self {
        let label = label.to_owned();
        let monomer = monomer.clone();

        Self::AttachmentLookup { label, monomer }
    }

    pub(crate) fn attachment_conflict(
        label: &str,
        monomer: &MonomerRef,
        state: impl Display,
    ) -> Self {
        let label = label.to_owned();
        let monomer = monomer.clone();
        let state = state.to_string();

        Self::AttachmentConflict {
            label,
            monomer,
            state,
        }
    }

    pub(crate) const fn node_lookup(node: NodeId) -> Self {
        Self::NodeLookup(node)
    }
}
