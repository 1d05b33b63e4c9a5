use ahash::HashMap;
use itertools::Itertools;
use polygraph::{Catalog, DetailedGraph, PolymerId, PolymerManager, manager::Strand};
use tracing::{instrument, trace};

use crate::{
    errors::Result,
    hypergraph::{HyperEdge, Hypergraph},
};

/// Serializes a graph back into notation text
///
/// Before anything is written, the polymers of `manager` are re-sorted (nucleic acids, then peptides, then chemicals;
/// sense strands before antisense ones), and any polymer paired with an earlier one is pulled up to sit right after
/// its partner. That new order is kept by `manager`, and polymer ids are renumbered to match it.
#[instrument(skip_all, fields(polymers = manager.len()))]
pub fn encode(
    graph: &DetailedGraph,
    manager: &mut PolymerManager,
    catalog: &dyn Catalog,
) -> Result<String> {
    sort_polymers(manager);
    let hypergraph = Hypergraph::build(graph, manager, catalog)?;
    gather_pairs(manager, &hypergraph);

    let names = polymer_names(manager);
    let name = |polymer: PolymerId| names.get(&polymer).map_or("", String::as_str);

    let polymers = manager
        .order()
        .iter()
        .filter_map(|&polymer| {
            let body = hypergraph.node(polymer)?.body();
            Some(format!("{}{{{body}}}", name(polymer)))
        })
        .join("|");

    let (pairs, connections): (Vec<_>, Vec<_>) = hypergraph
        .edges()
        .partition(|(_, _, edge)| edge.is_pair());
    let section = |edges: Vec<(PolymerId, PolymerId, &HyperEdge)>| {
        edges
            .into_iter()
            .map(|(source, target, edge)| {
                format!("{},{},{}", name(source), name(target), edge.description())
            })
            .join("|")
    };

    let annotations = manager
        .order()
        .iter()
        .filter_map(|&polymer| {
            let annotation = manager.polymer_annotation(polymer)?;
            Some(format!("{}{{{annotation}}}", name(polymer)))
        })
        .join("|");

    let notation = format!(
        "{polymers}${}${}${annotations}${}",
        section(connections),
        section(pairs),
        manager.extra()
    );
    trace!(%notation, "encoded graph");
    Ok(notation)
}

fn sort_polymers(manager: &mut PolymerManager) {
    let keys: HashMap<_, _> = manager
        .polymers()
        .map(|(polymer, entry)| {
            let strand = match manager.strand(polymer) {
                Some(Strand::Sense) => 0,
                None => 1,
                Some(Strand::Antisense) => 2,
            };
            (polymer, (entry.polymer_type(), strand))
        })
        .collect();
    manager.sort_polymers_by_key(|polymer| keys.get(polymer).copied());
}

// NOTE: This only ever pulls a partner up to its pair, it never pushes anything further down the order
fn gather_pairs(manager: &mut PolymerManager, hypergraph: &Hypergraph) {
    for index in 0..manager.len() {
        let Some(&polymer) = manager.order().get(index) else {
            break;
        };
        let partner = hypergraph.pair_partners(polymer).into_iter().find_map(|partner| {
            let at = manager.order().iter().position(|&p| p == partner)?;
            (at > index + 1).then_some(at)
        });
        if let Some(at) = partner {
            manager.move_polymer(at, index + 1);
        }
    }
}

// Ids restart from 1 for each marker, like `RNA1|RNA2|PEPTIDE1`
fn polymer_names(manager: &PolymerManager) -> HashMap<PolymerId, String> {
    let mut counts: HashMap<&str, u32> = HashMap::default();
    manager
        .polymers()
        .map(|(polymer, entry)| {
            let count = counts.entry(entry.marker()).or_default();
            *count += 1;
            (polymer, format!("{}{count}", entry.marker()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use once_cell::sync::Lazy;
    use polygraph::MonomerDatabase;

    use super::*;
    use crate::{Document, decode};

    static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

    fn reencode(notation: &str) -> String {
        let mut document = decode(notation, &*DB).unwrap();
        document.encode(&*DB).unwrap()
    }

    #[test]
    fn single_polymers() {
        assert_snapshot!(reencode("RNA1{R(A)P.R(G)P.R(C)}$$$$"), @"RNA1{R(A)P.R(G)P.R(C)}$$$$");
        assert_snapshot!(reencode("PEPTIDE1{A.G.S}$$$$"), @"PEPTIDE1{A.G.S}$$$$");
        assert_snapshot!(reencode("CHEM1{[Chol]}$$$$"), @"CHEM1{Chol}$$$$");
        assert_snapshot!(reencode("DNA1{[dR](T)P.[dR]([5meC])}$$$$"), @"DNA1{[dR](T)P.[dR]([5meC])}$$$$");
    }

    #[test]
    fn adhoc_monomers_are_written_as_smiles() {
        assert_snapshot!(
            reencode("RNA1{R([[*:1]c1ccccc1])P}|CHEM1{[[*:1]OCC[*:2]]}$$$$"),
            @"RNA1{R([[*:1]c1ccccc1])P}|CHEM1{[[*:1]OCC[*:2]]}$$$$"
        );
    }

    #[test]
    fn polymers_are_sorted_and_renumbered() {
        assert_snapshot!(
            reencode("CHEM1{PEG2}|PEPTIDE1{A.C}|RNA1{R(A)P}$PEPTIDE1,CHEM1,2:R2-1:R1$$$"),
            @"RNA1{R(A)P}|PEPTIDE1{A.C}|CHEM1{PEG2}$PEPTIDE1,CHEM1,2:R2-1:R1$$$"
        );
        // Markers are numbered independently
        assert_snapshot!(
            reencode("RNA7{R(A)}|DNA3{[dR](T)}|RNA2{R(U)}$$$$"),
            @"RNA1{R(A)}|DNA1{[dR](T)}|RNA2{R(U)}$$$$"
        );
    }

    #[test]
    fn strands_and_pairs_stay_together() {
        let notation = concat!(
            "RNA1{R(A)P.R(C)}|PEPTIDE1{G}|RNA2{R(G)P.R(U)}|RNA3{R(C)P.R(A)}",
            "$$RNA3,RNA1,2:pair-5:pair$RNA1{as}|RNA3{ss}$V2.0"
        );
        let mut document = decode(notation, &*DB).unwrap();
        assert_snapshot!(
            document.encode(&*DB).unwrap(),
            @"RNA1{R(C)P.R(A)}|RNA2{R(A)P.R(C)}|RNA3{R(G)P.R(U)}|PEPTIDE1{G}$$RNA1,RNA2,2:pair-5:pair$RNA1{ss}|RNA2{as}$V2.0"
        );
    }

    #[test]
    fn late_partners_move_up() {
        let notation = "RNA1{R(A)}|RNA2{R(C)}|RNA3{R(U)}$$RNA1,RNA3,2:pair-2:pair$$";
        let mut document = decode(notation, &*DB).unwrap();
        let order = document.manager().order().to_vec();
        assert_snapshot!(
            document.encode(&*DB).unwrap(),
            @"RNA1{R(A)}|RNA2{R(U)}|RNA3{R(C)}$$RNA1,RNA2,2:pair-2:pair$$"
        );
        assert_eq!(document.manager().order(), [order[0], order[2], order[1]]);
    }

    #[test]
    fn empty_documents() {
        let document = Document::default();
        let mut manager = document.manager().clone();
        assert_eq!(encode(document.graph(), &mut manager, &*DB).unwrap(), "$$$$");
    }
}
