//! Ranking of conflicting proofs.

use std::cmp::Ordering;

use avalanche_types::Proof;

/// Decides which of two proofs claiming the same stake is kept.
///
/// In order of precedence:
/// 1. the larger staked amount wins, since it is the most likely to be selected;
/// 2. the proof with fewer stakes wins, its stakes being larger on average;
/// 3. the lower proof id wins. Ids are unique, so two distinct proofs never tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConflictingProofComparator;

impl ConflictingProofComparator {
    /// `Less` means `lhs` is the better proof.
    pub fn compare(&self, lhs: &Proof, rhs: &Proof) -> Ordering {
        rhs.staked_amount()
            .cmp(&lhs.staked_amount())
            .then_with(|| lhs.stakes().len().cmp(&rhs.stakes().len()))
            .then_with(|| lhs.id().cmp(rhs.id()))
    }

    /// Whether `lhs` should be kept over `rhs`.
    pub fn prefers(&self, lhs: &Proof, rhs: &Proof) -> bool {
        self.compare(lhs, rhs) == Ordering::Less
    }
}
