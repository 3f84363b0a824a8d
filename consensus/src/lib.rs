//! Stake conflict resolution.
//!
//! Every unspent output may back at most one proof. The [`ProofPool`] indexes
//! proofs both by identity and by each outpoint they stake, refuses a proof that
//! claims an outpoint already taken, and, when asked, lets a better proof evict
//! the incumbents it conflicts with.
//!
//! ## Module overview
//!
//! - [`comparator`]: The total order deciding which of two conflicting proofs is kept.
//! - [`conflicts`]: The ranked set of incumbents a candidate collided with.
//! - [`proof_pool`]: The dual-indexed pool, admission, eviction and rescan.

pub mod comparator;
pub mod conflicts;
pub mod proof_pool;

pub use comparator::ConflictingProofComparator;
pub use conflicts::ConflictingProofSet;
pub use proof_pool::{AddProofStatus, ProofPool, ProofRegistrar};
