//! Slot: one peer's share of the cumulative weight space.

/// The half-open interval `[start, stop)`.
///
/// A zero-width slot (`start == stop`) belongs to a removed peer and can never
/// be selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    start: u64,
    stop: u64,
}

impl Slot {
    /// # Panics
    /// Panics if `stop < start`.
    pub fn new(start: u64, stop: u64) -> Self {
        assert!(start <= stop, "slot start {start} past stop {stop}");
        Self { start, stop }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Width of the slot, i.e. the peer's weight.
    pub fn score(&self) -> u64 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    pub fn contains(&self, slot: u64) -> bool {
        self.start <= slot && slot < self.stop
    }

    /// The whole slot lies before `slot`.
    pub fn precedes(&self, slot: u64) -> bool {
        slot >= self.stop
    }

    /// The whole slot lies after `slot`.
    pub fn follows(&self, slot: u64) -> bool {
        self.start > slot
    }

    /// The same width moved to begin at `start`.
    pub(crate) fn with_start(&self, start: u64) -> Self {
        Self::new(start, start + self.score())
    }
}
