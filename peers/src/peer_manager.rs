//! Peer slot allocator.
//!
//! Peer `i` owns `slots[i]`. Slots are sorted by start, never overlap, and tile
//! `[0, slot_count)` except for dead gaps left behind when a peer shrinks or is
//! removed. The total width of those gaps is tracked as `fragmentation` and is
//! reclaimed by [`PeerManager::compact`]. Peer indices never change, so callers
//! can keep referring to a peer by index across removals and compactions.

use tracing::{debug, trace};

use crate::slot::Slot;
use crate::source::{RngSlotSource, SlotSource};

/// Draws attempted before giving up when they keep landing in dead space.
pub const SELECT_PEER_MAX_RETRY: usize = 3;

/// Below this many candidate slots, the search falls back to a linear scan.
const LINEAR_SEARCH_CUTOFF: usize = 8;

/// Weighted slot allocator with O(log n) expected-time selection.
#[derive(Clone, Debug)]
pub struct PeerManager {
    slots: Vec<Slot>,
    /// Upper bound of the occupied range, i.e. the last slot's stop.
    slot_count: u64,
    /// Total width of dead gaps between slots.
    fragmentation: u64,
    max_retry: usize,
    /// 0 disables automatic compaction.
    compaction_threshold_percent: u8,
}

impl PeerManager {
    /// An empty allocator with the default retry budget and no automatic compaction.
    pub fn new() -> Self {
        Self::with_params(SELECT_PEER_MAX_RETRY, 0)
    }

    /// An empty allocator that compacts itself once dead space exceeds
    /// `compaction_threshold_percent` of the slot space.
    pub fn with_params(max_retry: usize, compaction_threshold_percent: u8) -> Self {
        Self {
            slots: Vec::new(),
            slot_count: 0,
            fragmentation: 0,
            max_retry: max_retry.max(1),
            compaction_threshold_percent: compaction_threshold_percent.min(100),
        }
    }

    /// Append a peer with the given score and return its index.
    ///
    /// A zero score is legal and yields a slot that is never selected.
    pub fn add_peer(&mut self, score: u64) -> usize {
        let start = self.slot_count;
        let stop = start.checked_add(score).expect("slot space overflow");
        self.slots.push(Slot::new(start, stop));
        self.slot_count = stop;

        let peer = self.slots.len() - 1;
        trace!(peer, score, start, "peer added");
        peer
    }

    /// Resize peer `i`'s slot to `score`.
    ///
    /// Shrinking leaves the freed tail as a dead gap; growing shifts every later
    /// slot up by the difference. The last slot is resized in place.
    ///
    /// # Panics
    /// Panics if `i` is not a peer index.
    pub fn rescore_peer(&mut self, i: usize, score: u64) {
        assert!(
            i < self.slots.len(),
            "peer index {i} out of range ({} peers)",
            self.slots.len()
        );

        let current = self.slots[i];
        let start = current.start();
        let old_score = current.score();
        let stop = start.checked_add(score).expect("slot space overflow");

        if i + 1 == self.slots.len() {
            self.slots[i] = Slot::new(start, stop);
            self.slot_count = stop;
            trace!(peer = i, old_score, score, "last peer resized");
            return;
        }

        if score <= old_score {
            self.slots[i] = Slot::new(start, stop);
            self.fragmentation += old_score - score;
            trace!(
                peer = i,
                old_score,
                score,
                fragmentation = self.fragmentation,
                "peer shrunk"
            );
            self.maybe_compact();
            return;
        }

        let delta = score - old_score;
        self.slot_count = self
            .slot_count
            .checked_add(delta)
            .expect("slot space overflow");
        self.slots[i] = Slot::new(start, stop);
        for slot in &mut self.slots[i + 1..] {
            *slot = slot.with_start(slot.start() + delta);
        }
        trace!(peer = i, old_score, score, "peer grown, later slots shifted");
    }

    /// Zero out peer `i`'s weight. The index stays allocated.
    ///
    /// # Panics
    /// Panics if `i` is not a peer index.
    pub fn remove_peer(&mut self, i: usize) {
        self.rescore_peer(i, 0);
    }

    /// Re-tile all slots contiguously from zero, in index order.
    ///
    /// Returns the amount of slot space reclaimed. Peer indices and scores are
    /// unchanged.
    pub fn compact(&mut self) -> u64 {
        let mut next = 0;
        for slot in &mut self.slots {
            *slot = slot.with_start(next);
            next = slot.stop();
        }

        let reclaimed = self.slot_count - next;
        debug_assert_eq!(reclaimed, self.fragmentation);
        self.slot_count = next;
        self.fragmentation = 0;

        debug!(reclaimed, slot_count = next, "peer slots compacted");
        reclaimed
    }

    fn maybe_compact(&mut self) {
        if self.compaction_threshold_percent == 0 {
            return;
        }
        let dead = u128::from(self.fragmentation) * 100;
        let limit = u128::from(self.slot_count) * u128::from(self.compaction_threshold_percent);
        if dead > limit {
            self.compact();
        }
    }

    /// Pick a peer with probability proportional to its score.
    ///
    /// A draw landing in dead space is re-drawn, up to the retry budget; `None`
    /// is returned if every draw missed or no peer has any weight.
    pub fn select_peer<S: SlotSource + ?Sized>(&self, source: &mut S) -> Option<usize> {
        if self.slot_count == self.fragmentation {
            return None;
        }

        let max = self.slot_count;
        for _ in 0..self.max_retry {
            let draw = source.next_slot(max);
            if let Some(peer) = select_peer_impl(&self.slots, draw, max) {
                return Some(peer);
            }
        }

        debug!(
            retries = self.max_retry,
            fragmentation = self.fragmentation,
            slot_count = self.slot_count,
            "every selection draw landed in dead slot space"
        );
        None
    }

    /// [`select_peer`](Self::select_peer) using the thread-local generator.
    pub fn select_random_peer(&self) -> Option<usize> {
        self.select_peer(&mut RngSlotSource(rand::thread_rng()))
    }

    /// Check the tiling invariant and the fragmentation accounting.
    pub fn verify(&self) -> bool {
        let mut prev_stop = 0;
        let mut gaps = 0u64;
        for slot in &self.slots {
            if slot.start() < prev_stop {
                return false;
            }
            gaps += slot.start() - prev_stop;
            prev_stop = slot.stop();
        }
        prev_stop == self.slot_count && gaps == self.fragmentation
    }

    pub fn slot_count(&self) -> u64 {
        self.slot_count
    }

    pub fn fragmentation(&self) -> u64 {
        self.fragmentation
    }

    /// Number of allocated peer indices, removed peers included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// # Panics
    /// Panics if `i` is not a peer index.
    pub fn peer_score(&self, i: usize) -> u64 {
        self.slots[i].score()
    }
}

impl Default for PeerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the index of the slot containing `slot`, searching values below `max`.
///
/// `slots` must be sorted by start and non-overlapping. While many candidates
/// remain, the position is estimated by interpolating `slot` inside the current
/// value window; the window shrinks on every miss. Returns `None` when `slot`
/// falls in a gap or outside the occupied range.
pub fn select_peer_impl(slots: &[Slot], slot: u64, max: u64) -> Option<usize> {
    if slot >= max {
        return None;
    }

    let (mut begin, mut end) = (0usize, slots.len());
    let (mut bottom, mut top) = (0u64, max);

    while end - begin > LINEAR_SEARCH_CUTOFF {
        if slot < bottom || slot >= top {
            return None;
        }

        let width = (end - begin) as u128;
        let offset = u128::from(slot - bottom) * width / u128::from(top - bottom);
        let i = begin + offset as usize;
        debug_assert!(begin <= i && i < end);

        let candidate = &slots[i];
        if candidate.contains(slot) {
            return Some(i);
        }

        if candidate.precedes(slot) {
            // Undershot.
            begin = i + 1;
            if begin >= end {
                return None;
            }
            bottom = slots[begin].start();
        } else {
            // Overshot.
            debug_assert!(candidate.follows(slot));
            end = i;
            top = slots[end].start();
        }
    }

    slots[begin..end]
        .iter()
        .position(|s| s.contains(slot))
        .map(|offset| begin + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Replays scripted draws.
    struct Scripted(VecDeque<u64>);

    impl Scripted {
        fn new(draws: &[u64]) -> Self {
            Self(draws.iter().copied().collect())
        }
    }

    impl SlotSource for Scripted {
        fn next_slot(&mut self, max: u64) -> u64 {
            let draw = self.0.pop_front().expect("script exhausted");
            assert!(draw < max, "scripted draw {draw} outside [0, {max})");
            draw
        }
    }

    #[test]
    fn select_linear() {
        let mut slots = vec![Slot::new(100, 200)];
        for v in 0..100 {
            assert_eq!(select_peer_impl(&slots, v, 300), None);
        }
        for v in 100..200 {
            assert_eq!(select_peer_impl(&slots, v, 300), Some(0));
        }
        for v in 200..300 {
            assert_eq!(select_peer_impl(&slots, v, 300), None);
        }

        slots.push(Slot::new(300, 400));
        for v in 200..300 {
            assert_eq!(select_peer_impl(&slots, v, 400), None);
        }
        for v in 300..400 {
            assert_eq!(select_peer_impl(&slots, v, 400), Some(1));
        }
        assert_eq!(select_peer_impl(&slots, 400, 400), None);
    }

    #[test]
    fn select_dichotomic() {
        // 100 slots of width 50, each followed by a 50-wide gap.
        let slots: Vec<Slot> = (0..100u64).map(|i| Slot::new(i * 100, i * 100 + 50)).collect();
        let max = 100 * 100;
        for v in 0..max {
            let expected = if v % 100 < 50 { Some((v / 100) as usize) } else { None };
            assert_eq!(select_peer_impl(&slots, v, max), expected, "draw {v}");
        }
    }

    #[test]
    fn select_uneven_widths() {
        // Widths grow quadratically, so interpolation guesses are far off.
        let mut start = 0;
        let mut slots = Vec::new();
        for i in 0..40u64 {
            slots.push(Slot::new(start, start + i * i + 1));
            start += i * i + 1;
        }
        for (idx, slot) in slots.iter().enumerate() {
            for v in [slot.start(), slot.stop() - 1] {
                assert_eq!(select_peer_impl(&slots, v, start), Some(idx));
            }
        }
    }

    #[test]
    fn select_skips_empty_slots() {
        let mut slots = vec![Slot::new(0, 10)];
        for _ in 0..20 {
            slots.push(Slot::new(10, 10));
        }
        slots.push(Slot::new(10, 20));
        for v in 0..10 {
            assert_eq!(select_peer_impl(&slots, v, 20), Some(0));
        }
        for v in 10..20 {
            assert_eq!(select_peer_impl(&slots, v, 20), Some(21));
        }
    }

    #[test]
    fn add_peer_tiles_space() {
        let mut pm = PeerManager::new();
        assert_eq!(pm.add_peer(100), 0);
        assert_eq!(pm.add_peer(0), 1);
        assert_eq!(pm.add_peer(50), 2);

        assert_eq!(pm.slot_count(), 150);
        assert_eq!(pm.fragmentation(), 0);
        assert_eq!(pm.slots()[1], Slot::new(100, 100));
        assert_eq!(pm.slots()[2], Slot::new(100, 150));
        assert!(pm.verify());
    }

    #[test]
    fn remove_peer_leaves_gap() {
        let mut pm = PeerManager::new();
        for score in [100, 200, 300, 400] {
            pm.add_peer(score);
        }

        pm.remove_peer(1);
        assert_eq!(pm.slot_count(), 1000);
        assert_eq!(pm.fragmentation(), 200);
        assert_eq!(pm.peer_score(1), 0);
        assert_eq!(pm.len(), 4);
        assert!(pm.verify());

        let mut rng = RngSlotSource(StdRng::seed_from_u64(7));
        for _ in 0..1_000 {
            assert_ne!(pm.select_peer(&mut rng), Some(1));
        }
    }

    #[test]
    fn rescore_last_peer_resizes_in_place() {
        let mut pm = PeerManager::new();
        pm.add_peer(100);
        pm.add_peer(100);

        pm.rescore_peer(1, 40);
        assert_eq!(pm.slot_count(), 140);
        assert_eq!(pm.fragmentation(), 0);

        pm.rescore_peer(1, 500);
        assert_eq!(pm.slot_count(), 600);
        assert!(pm.verify());
    }

    #[test]
    fn rescore_grow_shifts_later_slots() {
        let mut pm = PeerManager::new();
        for _ in 0..3 {
            pm.add_peer(100);
        }

        pm.rescore_peer(0, 150);
        assert_eq!(pm.slots()[0], Slot::new(0, 150));
        assert_eq!(pm.slots()[1], Slot::new(150, 250));
        assert_eq!(pm.slots()[2], Slot::new(250, 350));
        assert_eq!(pm.slot_count(), 350);
        assert_eq!(pm.fragmentation(), 0);
        assert!(pm.verify());
    }

    #[test]
    fn rescore_grow_keeps_earlier_gaps() {
        let mut pm = PeerManager::new();
        for _ in 0..3 {
            pm.add_peer(100);
        }

        pm.rescore_peer(0, 30);
        pm.rescore_peer(1, 120);
        assert_eq!(pm.fragmentation(), 70);
        assert_eq!(pm.slots()[1], Slot::new(100, 220));
        assert_eq!(pm.slots()[2], Slot::new(220, 320));
        assert_eq!(pm.slot_count(), 320);
        assert!(pm.verify());
    }

    #[test]
    fn compact_reclaims_and_keeps_indices() {
        let mut pm = PeerManager::new();
        for score in [100, 200, 300] {
            pm.add_peer(score);
        }
        pm.remove_peer(0);
        pm.rescore_peer(1, 50);
        assert_eq!(pm.fragmentation(), 250);

        assert_eq!(pm.compact(), 250);
        assert_eq!(pm.fragmentation(), 0);
        assert_eq!(pm.slot_count(), 350);
        assert_eq!(pm.slots()[0], Slot::new(0, 0));
        assert_eq!(pm.slots()[1], Slot::new(0, 50));
        assert_eq!(pm.slots()[2], Slot::new(50, 350));
        assert!(pm.verify());

        assert_eq!(pm.compact(), 0);
    }

    #[test]
    fn automatic_compaction_above_threshold() {
        let mut pm = PeerManager::with_params(SELECT_PEER_MAX_RETRY, 50);
        for _ in 0..4 {
            pm.add_peer(100);
        }

        pm.remove_peer(0);
        assert_eq!(pm.fragmentation(), 100);

        pm.remove_peer(1);
        // 200 dead out of 400 is not above 50%.
        assert_eq!(pm.fragmentation(), 200);

        pm.rescore_peer(2, 90);
        assert_eq!(pm.fragmentation(), 0);
        assert_eq!(pm.slot_count(), 190);
        assert!(pm.verify());
    }

    #[test]
    fn draw_in_gap_is_redrawn() {
        let mut pm = PeerManager::new();
        pm.add_peer(100);
        pm.add_peer(100);
        pm.add_peer(100);
        pm.remove_peer(1);

        // Two draws in the dead gap [100, 200), then one in peer 2.
        let mut source = Scripted::new(&[150, 199, 250]);
        assert_eq!(pm.select_peer(&mut source), Some(2));
        assert!(source.0.is_empty());
    }

    #[test]
    fn retries_exhausted_returns_none() {
        let mut pm = PeerManager::new();
        pm.add_peer(100);
        pm.add_peer(100);
        pm.add_peer(100);
        pm.remove_peer(1);

        let mut source = Scripted::new(&[100, 150, 199, 0]);
        assert_eq!(pm.select_peer(&mut source), None);
        // The retry budget is three draws; the fourth is untouched.
        assert_eq!(source.0.len(), 1);
    }

    #[test]
    fn no_live_weight_draws_nothing() {
        let mut source = Scripted::new(&[]);

        let mut pm = PeerManager::new();
        assert_eq!(pm.select_peer(&mut source), None);

        pm.add_peer(0);
        assert_eq!(pm.select_peer(&mut source), None);

        pm.add_peer(10);
        pm.add_peer(10);
        pm.remove_peer(0);
        pm.remove_peer(1);
        pm.remove_peer(2);
        assert_eq!(pm.slot_count(), 10);
        assert_eq!(pm.fragmentation(), 10);
        assert_eq!(pm.select_peer(&mut source), None);
    }

    #[test]
    fn selection_is_proportional_to_score() {
        let mut pm = PeerManager::new();
        let scores = [100u64, 200, 300, 400];
        for score in scores {
            pm.add_peer(score);
        }

        let mut rng = RngSlotSource(StdRng::seed_from_u64(1234));
        let draws = 20_000;
        let mut hits = [0usize; 4];
        for _ in 0..draws {
            let peer = pm.select_peer(&mut rng).expect("no gaps, always selects");
            hits[peer] += 1;
        }

        for (peer, score) in scores.iter().enumerate() {
            let observed = hits[peer] as f64 / draws as f64;
            let expected = *score as f64 / 1000.0;
            assert!(
                (observed - expected).abs() < 0.02,
                "peer {peer}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn random_selection_finds_only_peer() {
        let mut pm = PeerManager::new();
        pm.add_peer(0);
        pm.add_peer(42);
        assert_eq!(pm.select_random_peer(), Some(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn rescore_unknown_peer_panics() {
        let mut pm = PeerManager::new();
        pm.add_peer(10);
        pm.rescore_peer(1, 5);
    }
}
