//! Prometheus metrics for proof registration and peer selection.
//!
//! The [`AvalancheMetrics`] struct owns a dedicated [`Registry`] so several
//! processors can live in one process without clashing on metric names.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

/// Counters and gauges maintained by the [`Processor`](crate::Processor).
pub struct AvalancheMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Proofs that entered the valid pool.
    pub proofs_registered: IntCounter,
    /// Registrations of a proof already held by one of the pools.
    pub proofs_duplicated: IntCounter,
    /// Proofs that lost a stake conflict and were parked as conflicting.
    pub proofs_conflicting: IntCounter,
    /// Valid proofs evicted by a better conflicting proof.
    pub proofs_evicted: IntCounter,
    /// Proofs discarded from, or refused by, the conflicting pool.
    pub proofs_dropped: IntCounter,
    /// Selections that returned no peer although live weight existed.
    pub peer_selection_misses: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub valid_proofs: IntGauge,
    pub conflicting_proofs: IntGauge,
    /// Peers with a proof attached.
    pub live_peers: IntGauge,
    pub slot_count: IntGauge,
    /// Dead slot space awaiting compaction.
    pub fragmentation: IntGauge,
}

impl AvalancheMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        // Counters
        let proofs_registered = register_int_counter_with_registry!(
            Opts::new(
                "avalanche_proofs_registered_total",
                "Total proofs admitted to the valid pool"
            ),
            registry
        )
        .expect("failed to register proofs_registered counter");

        let proofs_duplicated = register_int_counter_with_registry!(
            Opts::new(
                "avalanche_proofs_duplicated_total",
                "Total registrations of an already known proof"
            ),
            registry
        )
        .expect("failed to register proofs_duplicated counter");

        let proofs_conflicting = register_int_counter_with_registry!(
            Opts::new(
                "avalanche_proofs_conflicting_total",
                "Total proofs that lost a stake conflict"
            ),
            registry
        )
        .expect("failed to register proofs_conflicting counter");

        let proofs_evicted = register_int_counter_with_registry!(
            Opts::new(
                "avalanche_proofs_evicted_total",
                "Total valid proofs evicted by a preferred proof"
            ),
            registry
        )
        .expect("failed to register proofs_evicted counter");

        let proofs_dropped = register_int_counter_with_registry!(
            Opts::new(
                "avalanche_proofs_dropped_total",
                "Total conflicting proofs discarded"
            ),
            registry
        )
        .expect("failed to register proofs_dropped counter");

        let peer_selection_misses = register_int_counter_with_registry!(
            Opts::new(
                "avalanche_peer_selection_misses_total",
                "Total peer selections that exhausted their retries"
            ),
            registry
        )
        .expect("failed to register peer_selection_misses counter");

        // Gauges
        let valid_proofs = register_int_gauge_with_registry!(
            Opts::new("avalanche_valid_proofs", "Current number of valid proofs"),
            registry
        )
        .expect("failed to register valid_proofs gauge");

        let conflicting_proofs = register_int_gauge_with_registry!(
            Opts::new(
                "avalanche_conflicting_proofs",
                "Current number of conflicting proofs"
            ),
            registry
        )
        .expect("failed to register conflicting_proofs gauge");

        let live_peers = register_int_gauge_with_registry!(
            Opts::new("avalanche_live_peers", "Current number of live peers"),
            registry
        )
        .expect("failed to register live_peers gauge");

        let slot_count = register_int_gauge_with_registry!(
            Opts::new("avalanche_slot_count", "Current upper bound of slot space"),
            registry
        )
        .expect("failed to register slot_count gauge");

        let fragmentation = register_int_gauge_with_registry!(
            Opts::new("avalanche_fragmentation", "Current dead slot space"),
            registry
        )
        .expect("failed to register fragmentation gauge");

        Self {
            registry,
            proofs_registered,
            proofs_duplicated,
            proofs_conflicting,
            proofs_evicted,
            proofs_dropped,
            peer_selection_misses,
            valid_proofs,
            conflicting_proofs,
            live_peers,
            slot_count,
            fragmentation,
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .expect("text encoding into a Vec cannot fail");
        String::from_utf8(buf).expect("prometheus text format is UTF-8")
    }
}

impl Default for AvalancheMetrics {
    fn default() -> Self {
        Self::new()
    }
}
