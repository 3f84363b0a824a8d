//! Draw sources for peer selection.
//!
//! Selection randomness is injected so tests can script exact draws.

use rand::Rng;

/// Produces uniform draws in `[0, max)`.
pub trait SlotSource {
    /// Draw a value in `[0, max)`. Callers never pass `max == 0`.
    fn next_slot(&mut self, max: u64) -> u64;
}

/// Adapts any `rand` generator into a [`SlotSource`].
#[derive(Debug, Clone)]
pub struct RngSlotSource<R>(pub R);

impl<R: Rng> SlotSource for RngSlotSource<R> {
    fn next_slot(&mut self, max: u64) -> u64 {
        self.0.gen_range(0..max)
    }
}

impl<S: SlotSource + ?Sized> SlotSource for &mut S {
    fn next_slot(&mut self, max: u64) -> u64 {
        (**self).next_slot(max)
    }
}

impl<S: SlotSource + ?Sized> SlotSource for Box<S> {
    fn next_slot(&mut self, max: u64) -> u64 {
        (**self).next_slot(max)
    }
}
