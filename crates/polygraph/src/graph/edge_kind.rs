use crate::{EdgeKind, MonomerClass, PAIR, R3};

impl EdgeKind {
    /// Derives the kind of an edge from the class and attachment label of each of its endpoints
    ///
    /// Rules are checked in order, and the result never depends on which endpoint is the source:
    ///
    /// 1. Two `pair` points form a [`EdgeKind::Pair`]
    /// 2. Any chemical monomer makes a [`EdgeKind::Chemical`] link
    /// 3. Any branch monomer makes a [`EdgeKind::Regular`] backbone-to-branch edge
    /// 4. Two `R3` points form a [`EdgeKind::BranchToBranch`] cross-link
    /// 5. A single `R3` point forms a [`EdgeKind::BranchToBackbone`] link
    /// 6. Anything else is a [`EdgeKind::Regular`] backbone edge
    #[must_use]
    pub fn derive(source: (MonomerClass, &str), target: (MonomerClass, &str)) -> Self {
        let (source_class, source_label) = source;
        let (target_class, target_label) = target;
        let classes = [source_class, target_class];
        let side_chains = [source_label, target_label]
            .into_iter()
            .filter(|&label| label == R3)
            .count();

        if source_label == PAIR && target_label == PAIR {
            Self::Pair
        } else if classes.contains(&MonomerClass::Chemical) {
            Self::Chemical
        } else if classes.contains(&MonomerClass::Branch) {
            Self::Regular
        } else if side_chains == 2 {
            Self::BranchToBranch
        } else if side_chains == 1 {
            Self::BranchToBackbone
        } else {
            Self::Regular
        }
    }
}
