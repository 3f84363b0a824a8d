//! Conflicting proof sets.
//!
//! When a candidate collides with pooled proofs, the incumbents are collected
//! here, ranked by [`ConflictingProofComparator`] with the strongest first. The
//! pool only compares the candidate against [`ConflictingProofSet::best`]: a
//! candidate that beats the strongest incumbent beats all of them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use avalanche_types::{ProofId, ProofRef};

use crate::comparator::ConflictingProofComparator;

#[derive(Clone, Debug)]
struct Ranked(ProofRef);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        ConflictingProofComparator.compare(&self.0, &other.0)
    }
}

/// Proofs ranked best first, deduplicated by proof id.
#[derive(Clone, Debug, Default)]
pub struct ConflictingProofSet {
    ranked: BTreeSet<Ranked>,
}

impl ConflictingProofSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a proof. Returns false if a proof with the same id is present.
    pub fn insert(&mut self, proof: ProofRef) -> bool {
        self.ranked.insert(Ranked(proof))
    }

    /// The strongest proof in the set.
    pub fn best(&self) -> Option<&ProofRef> {
        self.ranked.first().map(|r| &r.0)
    }

    /// The weakest proof in the set.
    pub fn worst(&self) -> Option<&ProofRef> {
        self.ranked.last().map(|r| &r.0)
    }

    /// Proofs from strongest to weakest.
    pub fn iter(&self) -> impl Iterator<Item = &ProofRef> + '_ {
        self.ranked.iter().map(|r| &r.0)
    }

    pub fn contains(&self, proofid: &ProofId) -> bool {
        self.iter().any(|p| p.id() == proofid)
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avalanche_types::{Amount, OutPoint, ProofBuilder, PublicKey, Stake, TxId};

    fn proof(tag: u8, coins: u64) -> ProofRef {
        ProofBuilder::new(0, 0, PublicKey([tag; 32]))
            .add_stake(Stake::new(
                OutPoint::new(TxId::new([tag; 32]), 0),
                Amount::from_coins(coins),
                10,
                false,
                PublicKey([tag; 32]),
            ))
            .build_ref()
            .unwrap()
    }

    #[test]
    fn best_is_strongest_regardless_of_insertion_order() {
        let weak = proof(1, 10);
        let mid = proof(2, 20);
        let strong = proof(3, 30);

        let mut set = ConflictingProofSet::new();
        set.insert(weak.clone());
        set.insert(strong.clone());
        set.insert(mid.clone());

        assert_eq!(set.best().unwrap().id(), strong.id());
        assert_eq!(set.worst().unwrap().id(), weak.id());
        let order: Vec<_> = set.iter().map(|p| *p.id()).collect();
        assert_eq!(order, vec![*strong.id(), *mid.id(), *weak.id()]);
    }

    #[test]
    fn deduplicates_by_id() {
        let a = proof(1, 10);
        let mut set = ConflictingProofSet::new();
        assert!(set.insert(a.clone()));
        assert!(!set.insert(a.clone()));
        assert_eq!(set.len(), 1);
        assert!(set.contains(a.id()));

        set.clear();
        assert!(set.is_empty());
        assert!(set.best().is_none());
    }
}
