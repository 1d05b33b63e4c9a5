//! Walks over a [`DetailedGraph`](crate::DetailedGraph) that never cross pair edges

mod component;
mod priority;
mod sense;

pub use component::ComponentIter;
pub use priority::{SiblingPriority, by_priority};
pub use sense::SenseIter;
