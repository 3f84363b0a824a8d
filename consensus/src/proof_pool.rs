//! Proofs indexed by identity and by staked outpoint.
//!
//! Both indices hold handles to the same proofs. A proof with N stakes owns
//! exactly N outpoint entries plus one identity entry, and is either fully
//! present or fully absent: a rejected candidate is rolled back before the call
//! returns.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, trace};

use avalanche_types::{OutPoint, ProofId, ProofRef};

use crate::comparator::ConflictingProofComparator;
use crate::conflicts::ConflictingProofSet;

/// Outcome of offering a proof to the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddProofStatus {
    /// Every stake of the proof is now indexed under it.
    Succeed,
    /// A proof with the same id is already pooled; nothing changed.
    Duplicated,
    /// The proof conflicts with at least one pooled proof and was discarded.
    Rejected,
}

/// Receives the proofs handed back by [`ProofPool::rescan`].
pub trait ProofRegistrar {
    /// Register a proof, returning whether it was accepted.
    fn register_proof(&mut self, proof: ProofRef) -> bool;
}

/// Dual-indexed registry of proofs enforcing one proof per outpoint.
#[derive(Debug, Default)]
pub struct ProofPool {
    by_outpoint: BTreeMap<OutPoint, ProofRef>,
    by_proofid: BTreeMap<ProofId, ProofRef>,
}

impl ProofPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `proof` unless one of its stakes is already claimed.
    ///
    /// `conflicting_proofs` is cleared, then filled with every pooled proof
    /// claiming one of the candidate's outpoints.
    pub fn add_proof_if_no_conflict(
        &mut self,
        proof: &ProofRef,
        conflicting_proofs: &mut ConflictingProofSet,
    ) -> AddProofStatus {
        conflicting_proofs.clear();

        let proofid = *proof.id();
        if self.by_proofid.contains_key(&proofid) {
            return AddProofStatus::Duplicated;
        }

        for stake in proof.stakes() {
            match self.by_outpoint.entry(*stake.utxo()) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(proof));
                }
                Entry::Occupied(claimed) => {
                    if claimed.get().id() != &proofid {
                        conflicting_proofs.insert(Arc::clone(claimed.get()));
                    }
                }
            }
        }

        if !conflicting_proofs.is_empty() {
            // Undo the entries this call inserted; the incumbents stay.
            for stake in proof.stakes() {
                if let Entry::Occupied(claimed) = self.by_outpoint.entry(*stake.utxo()) {
                    if claimed.get().id() == &proofid {
                        claimed.remove();
                    }
                }
            }

            debug!(
                proof = %proofid,
                conflicts = conflicting_proofs.len(),
                "proof rejected, stakes already claimed"
            );
            return AddProofStatus::Rejected;
        }

        self.by_proofid.insert(proofid, Arc::clone(proof));
        trace!(proof = %proofid, stakes = proof.stakes().len(), "proof added");
        AddProofStatus::Succeed
    }

    /// Add `proof`, evicting the proofs it conflicts with if it beats all of them.
    ///
    /// On eviction the result is `Succeed` and `conflicting_proofs` still holds
    /// the evicted proofs so the caller can recycle them.
    ///
    /// # Panics
    /// Panics if the proof still conflicts after its conflicts were evicted,
    /// which would mean the indices are inconsistent.
    pub fn add_proof_if_preferred(
        &mut self,
        proof: &ProofRef,
        conflicting_proofs: &mut ConflictingProofSet,
    ) -> AddProofStatus {
        let status = self.add_proof_if_no_conflict(proof, conflicting_proofs);
        if status != AddProofStatus::Rejected {
            return status;
        }

        let preferred = conflicting_proofs
            .best()
            .is_some_and(|best| ConflictingProofComparator.prefers(proof, best));
        if !preferred {
            return AddProofStatus::Rejected;
        }

        for conflicting in conflicting_proofs.iter() {
            self.remove_proof(conflicting.id());
        }

        let retried = self.add_proof_if_no_conflict(proof, &mut ConflictingProofSet::new());
        assert_eq!(
            retried,
            AddProofStatus::Succeed,
            "proof {} still conflicts after evicting its conflicts",
            proof.id()
        );

        debug!(
            proof = %proof.id(),
            evicted = conflicting_proofs.len(),
            "conflicting proofs evicted in favour of a better proof"
        );
        AddProofStatus::Succeed
    }

    /// Remove a proof and every outpoint entry it owns.
    pub fn remove_proof(&mut self, proofid: &ProofId) -> bool {
        let Some(proof) = self.by_proofid.remove(proofid) else {
            return false;
        };

        for stake in proof.stakes() {
            if let Entry::Occupied(claimed) = self.by_outpoint.entry(*stake.utxo()) {
                if claimed.get().id() == proofid {
                    claimed.remove();
                }
            }
        }

        trace!(proof = %proofid, "proof removed");
        true
    }

    /// Empty the pool, then hand every proof it held to `registrar`, in proof id
    /// order. Returns the number of proofs handed back.
    ///
    /// What the registrar does with each proof, including adding it back to a
    /// pool, is up to the registrar.
    pub fn rescan<R: ProofRegistrar + ?Sized>(&mut self, registrar: &mut R) -> usize {
        let previous = std::mem::take(self);
        let count = previous.by_proofid.len();
        info!(proofs = count, "rescanning proof pool");

        for proof in previous.by_proofid.into_values() {
            registrar.register_proof(proof);
        }
        count
    }

    pub fn get_proof(&self, proofid: &ProofId) -> Option<ProofRef> {
        self.by_proofid.get(proofid).cloned()
    }

    /// The proof claiming `outpoint`, if any.
    pub fn get_proof_by_outpoint(&self, outpoint: &OutPoint) -> Option<ProofRef> {
        self.by_outpoint.get(outpoint).cloned()
    }

    pub fn contains(&self, proofid: &ProofId) -> bool {
        self.by_proofid.contains_key(proofid)
    }

    /// Number of distinct proofs.
    pub fn count_proofs(&self) -> usize {
        self.by_proofid.len()
    }

    /// Number of claimed outpoints.
    pub fn len(&self) -> usize {
        self.by_outpoint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_proofid.is_empty()
    }

    pub fn proof_ids(&self) -> impl Iterator<Item = &ProofId> + '_ {
        self.by_proofid.keys()
    }

    /// Pooled proofs in proof id order.
    pub fn proofs(&self) -> impl Iterator<Item = &ProofRef> + '_ {
        self.by_proofid.values()
    }

    /// The proof with the lowest score; among equal scores, the highest id.
    pub fn lowest_score_proof(&self) -> Option<ProofRef> {
        self.proofs()
            .min_by(|a, b| a.score().cmp(&b.score()).then_with(|| b.id().cmp(a.id())))
            .cloned()
    }
}
