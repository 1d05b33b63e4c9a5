//! Monomers given inline as SMILES, rather than by a catalog id

use itertools::Itertools;
use once_cell::sync::Lazy;
use polygraph::{MonomerClass, MonomerDescriptor};
use regex::Regex;

const SMILES_SYNTAX: &[char] = &['*', '=', '#', '(', ')', '@', '/', '\\', '[', ']', ':'];

// Matches `[*:n]` attachment markers, or bare, unnumbered `*`s
static ATTACHMENT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\*:(\d+)\]|\*").unwrap());

#[must_use]
pub fn is_smiles(token: &str) -> bool {
    token.contains(SMILES_SYNTAX)
}

/// The attachment points marked in `smiles`
///
/// Numbered `[*:n]` markers become `Rn`, and unnumbered `*` markers take the lowest numbers not already claimed, in
/// order of appearance. A number marked more than once names a single attachment point.
#[must_use]
pub fn attachment_points(smiles: &str) -> Vec<String> {
    let markers: Vec<Option<u32>> = ATTACHMENT_MARKER
        .captures_iter(smiles)
        .map(|captures| captures.get(1).and_then(|n| n.as_str().parse().ok()))
        .collect();

    let mut taken: Vec<u32> = markers.iter().flatten().copied().collect();
    let mut next_free = 1..;
    markers
        .into_iter()
        .map(|marker| {
            let number = marker.unwrap_or_else(|| {
                let free = next_free.find(|n| !taken.contains(n)).unwrap_or_default();
                taken.push(free);
                free
            });
            format!("R{number}")
        })
        .unique()
        .collect()
}

pub fn adhoc_descriptor(smiles: &str, class: MonomerClass) -> MonomerDescriptor {
    MonomerDescriptor {
        id: smiles.to_owned(),
        name: "Ad-hoc Monomer".to_owned(),
        natural_analog: "X".to_owned(),
        class,
        attachment_points: attachment_points(smiles),
        is_modified: true,
        smiles: Some(smiles.to_owned()),
    }
}
