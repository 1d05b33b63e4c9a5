use std::fmt::{self, Display, Formatter};

use crate::{
    AttachmentState, MonomerClass, MonomerDescriptor, MonomerRef, PAIR, PointState, PolymerType,
    Result, errors::PolygraphError,
};

impl AttachmentState {
    pub(crate) fn new(polymer_type: PolymerType, descriptor: &MonomerDescriptor) -> Self {
        let mut points: Vec<_> = descriptor
            .attachment_points
            .iter()
            .map(|label| (label.clone(), PointState::Free))
            .collect();

        let pairs = polymer_type.is_nucleic_acid() && descriptor.class == MonomerClass::Branch;
        if pairs && !descriptor.attachment_points.iter().any(|l| l == PAIR) {
            points.push((PAIR.to_owned(), PointState::Free));
        }

        Self { points }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|(label, _)| label.as_str())
    }

    pub fn free_labels(&self) -> impl Iterator<Item = &str> {
        self.points
            .iter()
            .filter(|(_, state)| state.is_free())
            .map(|(label, _)| label.as_str())
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.state(label).is_some()
    }

    #[must_use]
    pub fn state(&self, label: &str) -> Option<PointState> {
        self.points
            .iter()
            .find_map(|(l, state)| (l == label).then_some(*state))
    }

    #[must_use]
    pub fn is_free(&self, label: &str) -> bool {
        self.state(label).is_some_and(|state| state.is_free())
    }

    pub(crate) fn check_free(&self, label: &str, monomer: &MonomerRef) -> Result<()> {
        match self.state(label) {
            None => Err(PolygraphError::attachment_lookup(label, monomer).into()),
            Some(PointState::Free) => Ok(()),
            Some(state) => Err(PolygraphError::attachment_conflict(label, monomer, state).into()),
        }
    }

    // NOTE: Only call this once `check_free()` has passed
    pub(crate) fn set(&mut self, label: &str, new_state: PointState) {
        if let Some((_, state)) = self.points.iter_mut().find(|(l, _)| l == label) {
            *state = new_state;
        }
    }
}

impl Display for PointState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Free => "free",
                Self::Source(..) => "the source of an edge",
                Self::Target(..) => "the target of an edge",
            }
        )
    }
}
