//! Stake proofs.
//!
//! A proof bundles one or more stakes under a master key. Proofs are immutable
//! once built and are shared through [`ProofRef`]: the pools, conflict sets and
//! callers all hold handles to the same proof at the same time.

use std::sync::Arc;

use crate::amount::{Amount, COIN};
use crate::error::ProofError;
use crate::hash::{blake2b_256_multi, ProofId};
use crate::keys::PublicKey;
use crate::params::AvalancheParams;
use crate::stake::Stake;

/// Shared, immutable handle to a proof.
pub type ProofRef = Arc<Proof>;

/// A stake-backed claim used to weight a peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    sequence: u64,
    expiration_time: i64,
    master: PublicKey,
    /// Sorted by outpoint, no duplicates.
    stakes: Vec<Stake>,
    id: ProofId,
    staked_amount: Amount,
}

impl Proof {
    pub fn id(&self) -> &ProofId {
        &self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn expiration_time(&self) -> i64 {
        self.expiration_time
    }

    pub fn master(&self) -> &PublicKey {
        &self.master
    }

    pub fn stakes(&self) -> &[Stake] {
        &self.stakes
    }

    pub fn staked_amount(&self) -> Amount {
        self.staked_amount
    }

    /// Peer weight derived from the staked amount: 100 points per coin.
    pub fn score(&self) -> u32 {
        let score = u128::from(self.staked_amount.sats()) * 100 / u128::from(COIN);
        u32::try_from(score).unwrap_or(u32::MAX)
    }

    /// Check the structural limits from `params`.
    ///
    /// Signatures and UTXO existence are not checked here.
    pub fn check_structure(&self, params: &AvalancheParams) -> Result<(), ProofError> {
        if self.stakes.is_empty() {
            return Err(ProofError::NoStake);
        }
        if self.stakes.len() > params.max_proof_stakes {
            return Err(ProofError::TooManyStakes {
                count: self.stakes.len(),
                max: params.max_proof_stakes,
            });
        }
        if let Some(dust) = self
            .stakes
            .iter()
            .find(|s| s.amount() < params.stake_dust_threshold)
        {
            return Err(ProofError::DustThreshold {
                utxo: *dust.utxo(),
                amount: dust.amount(),
                threshold: params.stake_dust_threshold,
            });
        }
        Ok(())
    }

    fn compute_id(
        sequence: u64,
        expiration_time: i64,
        master: &PublicKey,
        stakes: &[Stake],
    ) -> ProofId {
        let mut encoded_stakes = Vec::with_capacity(stakes.len() * 80);
        for stake in stakes {
            stake.encode_into(&mut encoded_stakes);
        }
        let stake_count = (stakes.len() as u64).to_le_bytes();
        ProofId::new(blake2b_256_multi(&[
            &sequence.to_le_bytes(),
            &expiration_time.to_le_bytes(),
            master.as_bytes(),
            &stake_count,
            &encoded_stakes,
        ]))
    }
}

/// Assembles a [`Proof`], canonicalising stake order so the id does not
/// depend on the order stakes were added.
#[derive(Clone, Debug)]
pub struct ProofBuilder {
    sequence: u64,
    expiration_time: i64,
    master: PublicKey,
    stakes: Vec<Stake>,
}

impl ProofBuilder {
    pub fn new(sequence: u64, expiration_time: i64, master: PublicKey) -> Self {
        Self {
            sequence,
            expiration_time,
            master,
            stakes: Vec::new(),
        }
    }

    pub fn add_stake(mut self, stake: Stake) -> Self {
        self.stakes.push(stake);
        self
    }

    /// Build the proof.
    ///
    /// # Errors
    /// - `NoStake` if no stake was added
    /// - `DuplicateStake` if two stakes claim the same outpoint
    pub fn build(mut self) -> Result<Proof, ProofError> {
        if self.stakes.is_empty() {
            return Err(ProofError::NoStake);
        }

        self.stakes.sort_by(|a, b| a.utxo().cmp(b.utxo()));
        if let Some(pair) = self.stakes.windows(2).find(|w| w[0].utxo() == w[1].utxo()) {
            return Err(ProofError::DuplicateStake(*pair[0].utxo()));
        }

        let id = Proof::compute_id(
            self.sequence,
            self.expiration_time,
            &self.master,
            &self.stakes,
        );
        let staked_amount = self.stakes.iter().map(Stake::amount).sum();

        Ok(Proof {
            sequence: self.sequence,
            expiration_time: self.expiration_time,
            master: self.master,
            stakes: self.stakes,
            id,
            staked_amount,
        })
    }

    /// Build the proof straight into a shared handle.
    pub fn build_ref(self) -> Result<ProofRef, ProofError> {
        self.build().map(Arc::new)
    }
}
