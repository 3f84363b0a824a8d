//! Fundamental types for stake proofs.
//!
//! This crate defines the value types shared across every other crate in the workspace:
//! amounts, identifiers, outpoints, stakes, proofs, tunable parameters and the proof
//! validation error.

pub mod amount;
pub mod error;
pub mod hash;
pub mod keys;
pub mod outpoint;
pub mod params;
pub mod proof;
pub mod stake;

pub use amount::{Amount, COIN};
pub use error::ProofError;
pub use hash::{ProofId, TxId};
pub use keys::PublicKey;
pub use outpoint::OutPoint;
pub use params::AvalancheParams;
pub use proof::{Proof, ProofBuilder, ProofRef};
pub use stake::Stake;
