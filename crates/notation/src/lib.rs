//! Reads and writes the textual notation for polymers, like `RNA1{R(A)P.R(G)}|CHEM1{PEG2}$RNA1,CHEM1,4:R2-1:R1$$$`
//!
//! Decoding builds a [`DetailedGraph`] (with every sugar, linker, and base as a node of its own) along with the
//! [`PolymerManager`] that keeps track of its polymers. Encoding walks that graph and writes it back out.

mod builder;
mod cache;
mod encoder;
pub mod errors;
pub mod hypergraph;
pub mod parser;
pub mod smiles;

use polygraph::{Catalog, DetailedGraph, PolymerManager};
use tracing::instrument;

use builder::Builder;
use parser::final_parser;

pub use cache::NotationCache;
pub use encoder::encode;
pub use errors::{MalformedNotation, NotationError, NotationErrorKind, Result};

/// A decoded notation: the graph of its monomers, and the polymers those monomers belong to
#[derive(Clone, Debug, Default)]
pub struct Document {
    graph: DetailedGraph,
    manager: PolymerManager,
}

/// Parses `notation` and builds the graph it describes, looking its monomers up in `catalog`
///
/// Nothing is returned unless the whole notation is valid: a grammar error, an unknown monomer, or a reference to a
/// polymer, position, or attachment point that doesn't exist all abort decoding. Connections between attachment
/// points that are already taken, on the other hand, are quietly dropped.
#[instrument(skip(catalog))]
pub fn decode(notation: &str, catalog: &dyn Catalog) -> Result<Document> {
    let ast = final_parser(parser::notation)(notation)?;
    Builder::new(notation, catalog).build(ast)
}

impl Document {
    #[must_use]
    pub fn new(graph: DetailedGraph, manager: PolymerManager) -> Self {
        Self { graph, manager }
    }

    #[must_use]
    pub const fn graph(&self) -> &DetailedGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DetailedGraph {
        &mut self.graph
    }

    #[must_use]
    pub const fn manager(&self) -> &PolymerManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PolymerManager {
        &mut self.manager
    }

    #[must_use]
    pub fn into_parts(self) -> (DetailedGraph, PolymerManager) {
        (self.graph, self.manager)
    }

    /// Encodes this document, re-sorting its polymers in the process (see [`encode`])
    pub fn encode(&mut self, catalog: &dyn Catalog) -> Result<String> {
        encode(&self.graph, &mut self.manager, catalog)
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;
    use polygraph::{EdgeKind, MonomerClass, MonomerDatabase, PolymerType, R1, R2, R3, Terminal};

    use super::*;

    static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

    fn kind_of(notation: &str) -> NotationErrorKind {
        match *decode(notation, &*DB).unwrap_err() {
            NotationError::Malformed(error) => error.kind().clone(),
            error => panic!("expected a malformed notation, got {error:?}"),
        }
    }

    fn sequence(document: &Document) -> Vec<(String, u32)> {
        let graph = document.graph();
        graph
            .node_ids()
            .map(|node| {
                let node = graph.node(node).unwrap();
                (node.monomer().monomer_id().to_owned(), node.position())
            })
            .collect()
    }

    #[test]
    fn decode_nucleic_acid() {
        let document = decode("RNA1{R(A)P.R(G)P.R(C)}$$$$", &*DB).unwrap();
        let (graph, manager) = (document.graph(), document.manager());
        assert_eq!(graph.node_count(), 8);
        assert_eq!(graph.edge_count(), 7);
        assert_eq!(
            sequence(&document),
            [
                ("R", 1),
                ("A", 2),
                ("P", 3),
                ("R", 4),
                ("G", 5),
                ("P", 6),
                ("R", 7),
                ("C", 8)
            ]
            .map(|(id, position)| (id.to_owned(), position))
        );

        let polymer = manager.order()[0];
        assert_eq!(manager.polymer(polymer).unwrap().polymer_type(), PolymerType::NucleicAcid);
        let start = manager.starting_node(polymer).unwrap();
        assert_eq!(graph.node(start).unwrap().position(), 1);

        // Every edge is part of the chain
        for edge in graph.edge_ids() {
            assert!(graph.is_chain_edge(&*DB, edge).unwrap());
        }

        let find = |position| graph.node(graph.find_position(polymer, position).unwrap()).unwrap();
        assert_eq!(find(1).terminal(), Some(Terminal::FivePrime));
        assert_eq!(find(7).terminal(), Some(Terminal::ThreePrime));
        assert_eq!(find(4).terminal(), None);
        assert_eq!(
            [2, 5, 8].map(|position| find(position).residue_number()),
            [Some(1), Some(2), Some(3)]
        );
        // The last sugar still has a free R2
        assert!(find(7).attachments().is_free(R2));
        assert!(!find(1).attachments().is_free(R3));
    }

    #[test]
    fn decode_peptide_and_chemical() {
        let notation = "PEPTIDE1{A.G.S}|CHEM1{PEG2}$PEPTIDE1,CHEM1,3:R2-1:R1$$$";
        let document = decode(notation, &*DB).unwrap();
        let graph = document.graph();
        assert_eq!(graph.node_count(), 4);
        let kinds: Vec<_> = graph
            .edge_ids()
            .map(|edge| graph.edge(edge).unwrap().kind())
            .collect();
        assert_eq!(kinds, [EdgeKind::Regular, EdgeKind::Regular, EdgeKind::Chemical]);

        let [peptide, chem] = document.manager().order() else {
            panic!("expected two polymers");
        };
        let residues = graph.polymer_nodes(*peptide);
        let terminals: Vec<_> = residues
            .iter()
            .map(|&node| graph.node(node).unwrap().terminal())
            .collect();
        assert_eq!(terminals, [Some(Terminal::NTerminal), None, Some(Terminal::CTerminal)]);

        let linker = document.manager().starting_node(*chem).unwrap();
        assert_eq!(graph.class(&*DB, linker).unwrap(), MonomerClass::Chemical);
        assert!(!graph.node(linker).unwrap().attachments().is_free(R1));
    }

    #[test]
    fn decode_annotations_and_extra() {
        let notation = "RNA1{R(A)}|RNA2{R(U)}$$RNA1,RNA2,2:pair-2:pair$RNA2{as}$V2.0";
        let document = decode(notation, &*DB).unwrap();
        let manager = document.manager();
        let [first, second] = manager.order() else {
            panic!("expected two polymers");
        };
        assert_eq!(manager.polymer_annotation(*first), None);
        assert_eq!(manager.polymer_annotation(*second), Some("as"));
        assert_eq!(manager.extra(), "V2.0");

        let graph = document.graph();
        let pairs: Vec<_> = graph
            .edge_ids()
            .filter(|&edge| graph.edge(edge).unwrap().kind().is_pair())
            .collect();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn occupied_connections_are_dropped() {
        // The second connection reuses the sugar's R2, and the third reuses the linker's R1
        let notation = concat!(
            "RNA1{R(A)}|CHEM1{PEG2}|CHEM2{EG}",
            "$RNA1,CHEM1,1:R2-1:R1|RNA1,CHEM2,1:R2-1:R1|CHEM2,CHEM1,1:R2-1:R1$$$"
        );
        let document = decode(notation, &*DB).unwrap();
        let graph = document.graph();
        let chemical_edges = graph
            .edge_ids()
            .filter(|&edge| graph.edge(edge).unwrap().kind() == EdgeKind::Chemical)
            .count();
        assert_eq!(chemical_edges, 1);
    }

    #[test]
    fn adhoc_monomers() {
        let document = decode("RNA1{R([[*:1]c1ccccc1])P}|CHEM1{[*CC*]}$$$$", &*DB).unwrap();
        let graph = document.graph();
        let [rna, chem] = document.manager().order() else {
            panic!("expected two polymers");
        };
        let base = graph.find_position(*rna, 2).unwrap();
        let monomer = graph.node(base).unwrap().monomer();
        assert!(graph.is_adhoc(monomer));
        assert_eq!(graph.class(&*DB, base).unwrap(), MonomerClass::Branch);

        let linker = graph.find_position(*chem, 1).unwrap();
        let descriptor = graph.descriptor(&*DB, linker).unwrap();
        assert_eq!(descriptor.class, MonomerClass::Chemical);
        assert_eq!(descriptor.attachment_points, [R1, R2]);
    }

    #[test]
    fn decode_grammar_errors() {
        assert_eq!(kind_of("RNA1{R(A)P"), NotationErrorKind::ExpectedPolymerEnd);
        assert_eq!(kind_of("RNA1{R(A}$$$$"), NotationErrorKind::ExpectedBranchEnd);
        assert_eq!(kind_of("RNA1{[dR(A)}$$$$"), NotationErrorKind::ExpectedBracketEnd);
        assert_eq!(kind_of("RNA1{R(A)P}$$$"), NotationErrorKind::ExpectedSectionEnd);
        assert_eq!(kind_of("BLOB1{R}$$$$"), NotationErrorKind::ExpectedPolymerId);
        assert_eq!(kind_of("RNA1{R}$RNA1,RNA1,1:R2$$$"), NotationErrorKind::ExpectedDash);
    }

    #[test]
    fn decode_structure_errors() {
        assert_eq!(
            kind_of("RNA1{R}|RNA1{R}$$$$"),
            NotationErrorKind::DuplicatePolymer("RNA1".to_owned())
        );
        assert_eq!(
            kind_of("RNA1{R}$RNA1,CHEM1,1:R2-1:R1$$$"),
            NotationErrorKind::UndeclaredPolymer("CHEM1".to_owned())
        );
        assert_eq!(
            kind_of("RNA1{R}|CHEM1{PEG2}$RNA1,CHEM1,1:R2-2:R1$$$"),
            NotationErrorKind::MissingPosition {
                polymer: "CHEM1".to_owned(),
                position: 2
            }
        );
        assert_eq!(
            kind_of("RNA1{R}|CHEM1{PEG2}$RNA1,CHEM1,1:R2-1:R9$$$"),
            NotationErrorKind::UndeclaredAttachment {
                label: "R9".to_owned(),
                monomer: "PEG2".to_owned()
            }
        );
        assert_eq!(
            kind_of("RNA1{P(A)}$$$$"),
            NotationErrorKind::UnavailableAttachment {
                label: R3.to_owned(),
                monomer: "P".to_owned()
            }
        );
        assert_eq!(kind_of("CHEM1{PEG2.EG}$$$$"), NotationErrorKind::MultipleChemicalMonomers);
    }

    #[test]
    fn decode_unknown_monomers() {
        match *decode("RNA1{R(A)P.[xR](G)}$$$$", &*DB).unwrap_err() {
            NotationError::UnknownMonomer { span, id, .. } => {
                assert_eq!(id, "xR");
                assert_eq!((span.offset(), span.len()), (11, 4));
            }
            error => panic!("expected an unknown monomer, got {error:?}"),
        }
    }
}
