//! Structural proof validation errors.

use thiserror::Error;

use crate::amount::Amount;
use crate::outpoint::OutPoint;

/// Why a proof is structurally unacceptable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("proof has no stake")]
    NoStake,

    #[error("proof has {count} stakes, the maximum is {max}")]
    TooManyStakes { count: usize, max: usize },

    #[error("stake {utxo} of {amount} is below the dust threshold of {threshold}")]
    DustThreshold {
        utxo: OutPoint,
        amount: Amount,
        threshold: Amount,
    },

    #[error("outpoint {0} is staked more than once")]
    DuplicateStake(OutPoint),
}
