use divan::{AllocProfiler, Bencher, black_box};
use once_cell::sync::Lazy;
use polygraph::{
    DetailedGraph, MonomerDatabase, MonomerRef, NodeId, PolymerManager, PolymerType, R1, R2,
    catalog::monomer_database::DEFAULT_KDL,
    traversal::{ComponentIter, SenseIter, by_priority},
};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

const PEPTIDE: [&str; 20] = [
    "A", "R", "N", "D", "C", "Q", "E", "G", "H", "I", "L", "K", "M", "F", "P", "S", "T", "W", "Y", "V",
];

static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

static CHAIN: Lazy<(DetailedGraph, NodeId)> = Lazy::new(|| build_chain(&PEPTIDE));

fn build_chain(ids: &[&str]) -> (DetailedGraph, NodeId) {
    let mut graph = DetailedGraph::new();
    let polymer = PolymerManager::new().add_polymer(PolymerType::Peptide, "PEPTIDE");
    let nodes: Vec<_> = ids
        .iter()
        .zip(1..)
        .map(|(&id, position)| {
            let monomer = MonomerRef::new(PolymerType::Peptide, id);
            graph.add_monomer(&*DB, monomer, polymer, position).unwrap()
        })
        .collect();
    for pair in nodes.windows(2) {
        graph.insert_connection(&*DB, (pair[0], R2), (pair[1], R1)).unwrap();
    }
    (graph, nodes[0])
}

fn main() {
    Lazy::force(&DB);
    Lazy::force(&CHAIN);
    divan::main();
}

#[divan::bench]
fn build_monomer_database() -> MonomerDatabase {
    MonomerDatabase::new("monomer_database.kdl", DEFAULT_KDL).unwrap()
}

#[divan::bench(args = [1, 5, 20])]
fn build_peptide_chain(bencher: Bencher, residues: usize) {
    bencher.bench(|| build_chain(black_box(&PEPTIDE[..residues])));
}

#[divan::bench]
fn walk_component() -> usize {
    let (graph, start) = &*CHAIN;
    ComponentIter::new(graph, *start, |_| true).count()
}

#[divan::bench]
fn walk_sense() -> usize {
    let (graph, start) = &*CHAIN;
    SenseIter::new(graph, *start)
        .order_by(by_priority(graph, &*DB))
        .count()
}
