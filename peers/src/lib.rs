//! Stake-weighted peer selection.
//!
//! Every peer owns a [`Slot`]: a half-open interval of a cumulative weight space
//! `[0, slot_count)` whose width is the peer's score. Drawing a uniform value in
//! that space and finding the slot containing it selects a peer with probability
//! proportional to its score.
//!
//! ## Module overview
//!
//! - [`slot`]: The slot interval type.
//! - [`source`]: Where selection draws come from (`rand`, or scripted in tests).
//! - [`peer_manager`]: The slot allocator: add, rescore, remove, compact, select.

pub mod peer_manager;
pub mod slot;
pub mod source;

pub use peer_manager::{select_peer_impl, PeerManager, SELECT_PEER_MAX_RETRY};
pub use slot::Slot;
pub use source::{RngSlotSource, SlotSource};
