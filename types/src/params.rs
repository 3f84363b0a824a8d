//! Tunable parameters for proof admission and peer selection.

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, COIN};

/// Parameters shared by the proof pools and the peer slot allocator.
///
/// Every field has a default, so a partial TOML table only overrides what it names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvalancheParams {
    // ── Proof structure ──────────────────────────────────────────────────
    /// Maximum number of stakes a single proof may carry.
    pub max_proof_stakes: usize,

    /// Minimum amount of every individual stake.
    pub stake_dust_threshold: Amount,

    // ── Peer selection ───────────────────────────────────────────────────
    /// Draws attempted by `select_peer` before giving up when draws keep
    /// landing in dead slot space.
    pub select_peer_max_retry: usize,

    /// Dead slot space, as a percentage of the total, above which slots are
    /// compacted after a peer shrinks. 0 disables automatic compaction.
    pub compaction_threshold_percent: u8,

    // ── Conflicting proofs ───────────────────────────────────────────────
    /// Capacity of the pool parking proofs that lost a stake conflict. Past
    /// it, the lowest scoring parked proof is dropped.
    pub max_conflicting_proofs: usize,
}

impl AvalancheParams {
    pub const DEFAULT_MAX_PROOF_STAKES: usize = 1000;
    pub const DEFAULT_SELECT_PEER_MAX_RETRY: usize = 3;
    pub const DEFAULT_MAX_CONFLICTING_PROOFS: usize = 1000;
}

impl Default for AvalancheParams {
    fn default() -> Self {
        Self {
            max_proof_stakes: Self::DEFAULT_MAX_PROOF_STAKES,
            stake_dust_threshold: Amount::new(COIN),
            select_peer_max_retry: Self::DEFAULT_SELECT_PEER_MAX_RETRY,
            compaction_threshold_percent: 50,
            max_conflicting_proofs: Self::DEFAULT_MAX_CONFLICTING_PROOFS,
        }
    }
}
