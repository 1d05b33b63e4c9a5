use ahash::{HashMap, HashSet};
use derive_more::{Display, IsVariant};

use crate::{NodeId, PolymerId, PolymerType};

/// Per-document bookkeeping for the polymers stored in a [`DetailedGraph`](crate::DetailedGraph)
///
/// Polymers are kept in a significant order (initially the order they were declared in), each anchored by its
/// starting node. The manager also holds free-text annotations attached to nodes, the set of polymers a layout has
/// flipped horizontally, and any trailing notation text that isn't understood but must be preserved.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct PolymerManager {
    polymers: Vec<PolymerEntry>,
    order: Vec<PolymerId>,
    annotations: HashMap<NodeId, String>,
    flipped: HashSet<PolymerId>,
    extra: String,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PolymerEntry {
    polymer_type: PolymerType,
    marker: String,
    starting_node: Option<NodeId>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, IsVariant)]
pub enum Strand {
    #[display("sense")]
    Sense,
    #[display("antisense")]
    Antisense,
}

impl PolymerEntry {
    #[must_use]
    pub const fn polymer_type(&self) -> PolymerType {
        self.polymer_type
    }

    /// The notation marker this polymer was declared with, like `RNA` or `PEPTIDE`
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    #[must_use]
    pub const fn starting_node(&self) -> Option<NodeId> {
        self.starting_node
    }
}

impl Strand {
    /// Classifies an annotation like `ss` or `antisense`, ignoring case
    #[must_use]
    pub fn from_annotation(annotation: &str) -> Option<Self> {
        match annotation.trim().to_ascii_lowercase().as_str() {
            "ss" | "sense" => Some(Self::Sense),
            "as" | "antisense" => Some(Self::Antisense),
            _ => None,
        }
    }
}

impl PolymerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every polymer, annotation, and flag
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // Polymers --------------------------------------------------------------------------------------------------------

    pub fn add_polymer(&mut self, polymer_type: PolymerType, marker: impl Into<String>) -> PolymerId {
        let id = PolymerId(self.polymers.len());
        self.polymers.push(PolymerEntry {
            polymer_type,
            marker: marker.into(),
            starting_node: None,
        });
        self.order.push(id);
        id
    }

    #[must_use]
    pub fn polymer(&self, polymer: PolymerId) -> Option<&PolymerEntry> {
        self.polymers.get(polymer.0)
    }

    /// Every polymer, in the manager's current order
    pub fn polymers(&self) -> impl Iterator<Item = (PolymerId, &PolymerEntry)> {
        self.order.iter().map(|&id| (id, &self.polymers[id.0]))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.polymers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polymers.is_empty()
    }

    // Ordering --------------------------------------------------------------------------------------------------------

    #[must_use]
    pub fn order(&self) -> &[PolymerId] {
        &self.order
    }

    /// Stably re-sorts the polymers by a key
    pub fn sort_polymers_by_key<K: Ord>(&mut self, key: impl FnMut(&PolymerId) -> K) {
        self.order.sort_by_key(key);
    }

    /// Moves the polymer at index `from` of the current order so that it sits at index `to`
    pub fn move_polymer(&mut self, from: usize, to: usize) {
        if from < self.order.len() && to < self.order.len() {
            let polymer = self.order.remove(from);
            self.order.insert(to, polymer);
        }
    }

    // Starting Nodes --------------------------------------------------------------------------------------------------

    pub fn set_starting_node(&mut self, polymer: PolymerId, node: NodeId) {
        if let Some(entry) = self.polymers.get_mut(polymer.0) {
            entry.starting_node = Some(node);
        }
    }

    #[must_use]
    pub fn starting_node(&self, polymer: PolymerId) -> Option<NodeId> {
        self.polymer(polymer)?.starting_node
    }

    /// The starting node of every polymer, in the manager's current order
    pub fn starting_nodes(&self) -> impl Iterator<Item = NodeId> {
        self.polymers().filter_map(|(_, entry)| entry.starting_node)
    }

    #[must_use]
    pub fn polymer_starting_at(&self, node: NodeId) -> Option<PolymerId> {
        self.polymers()
            .find_map(|(id, entry)| (entry.starting_node == Some(node)).then_some(id))
    }

    // Annotations -----------------------------------------------------------------------------------------------------

    pub fn annotate(&mut self, node: NodeId, annotation: impl Into<String>) {
        self.annotations.insert(node, annotation.into());
    }

    pub fn remove_annotation(&mut self, node: NodeId) -> Option<String> {
        self.annotations.remove(&node)
    }

    #[must_use]
    pub fn annotation(&self, node: NodeId) -> Option<&str> {
        self.annotations.get(&node).map(String::as_str)
    }

    /// The annotation on a polymer's starting node
    #[must_use]
    pub fn polymer_annotation(&self, polymer: PolymerId) -> Option<&str> {
        self.annotation(self.starting_node(polymer)?)
    }

    /// The strand a nucleic acid has been annotated as, if any
    #[must_use]
    pub fn strand(&self, polymer: PolymerId) -> Option<Strand> {
        let entry = self.polymer(polymer)?;
        if entry.polymer_type.is_nucleic_acid() {
            self.polymer_annotation(polymer)
                .and_then(Strand::from_annotation)
        } else {
            None
        }
    }

    // Layout Flags ----------------------------------------------------------------------------------------------------

    pub fn set_flipped(&mut self, polymer: PolymerId, flipped: bool) {
        if flipped {
            self.flipped.insert(polymer);
        } else {
            self.flipped.remove(&polymer);
        }
    }

    #[must_use]
    pub fn is_flipped(&self, polymer: PolymerId) -> bool {
        self.flipped.contains(&polymer)
    }

    // Extra Notation --------------------------------------------------------------------------------------------------

    #[must_use]
    pub fn extra(&self) -> &str {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: impl Into<String>) {
        self.extra = extra.into();
    }
}
