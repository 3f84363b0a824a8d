//! Proof registration and stake-weighted peer selection.
//!
//! The processor keeps two pools. The *valid* pool holds the proofs currently
//! backing a peer; it never holds two proofs claiming the same outpoint. The
//! *conflicting* pool parks proofs that lost a stake conflict, so they can be
//! promoted when the proof holding their stakes goes away. Every valid proof owns
//! exactly one peer in the slot allocator, weighted by the proof's score.
//!
//! All state sits behind a single lock; every public operation takes it once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use avalanche_consensus::{AddProofStatus, ConflictingProofSet, ProofPool, ProofRegistrar};
use avalanche_peers::{PeerManager, RngSlotSource, SlotSource};
use avalanche_types::{AvalancheParams, ProofId, ProofRef};

use crate::config::NodeConfig;
use crate::metrics::AvalancheMetrics;
use crate::NodeError;

/// Outcome of [`Processor::register_proof`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// The proof is valid and backs the peer at this index.
    Registered { peer: usize },
    /// One of the pools already holds a proof with this id.
    AlreadyRegistered,
    /// The proof lost a stake conflict and was parked.
    Conflicting,
    /// The proof lost a stake conflict and a better parked proof holds its
    /// stakes, or the parking pool is full; it was discarded.
    Dropped,
}

struct Inner {
    valid: ProofPool,
    conflicting: ProofPool,
    peers: PeerManager,
    peer_by_proof: HashMap<ProofId, usize>,
    /// Indexed by peer; `None` once the peer's proof is gone.
    proof_by_peer: Vec<Option<ProofRef>>,
    /// Peer indices whose proof is gone, handed out again before new ones.
    free_peers: Vec<usize>,
    source: Box<dyn SlotSource + Send>,
    params: AvalancheParams,
    metrics: Arc<AvalancheMetrics>,
}

impl Inner {
    fn register(&mut self, proof: ProofRef) -> Result<Registration, NodeError> {
        proof.check_structure(&self.params)?;

        let proofid = *proof.id();
        if self.valid.contains(&proofid) || self.conflicting.contains(&proofid) {
            self.metrics.proofs_duplicated.inc();
            trace!(proof = %proofid, "proof already registered");
            return Ok(Registration::AlreadyRegistered);
        }

        let mut evicted = ConflictingProofSet::new();
        match self.valid.add_proof_if_preferred(&proof, &mut evicted) {
            AddProofStatus::Succeed => {
                for loser in evicted.iter() {
                    self.detach_peer(loser.id());
                    self.park(loser);
                    self.metrics.proofs_evicted.inc();
                }
                let peer = self.attach_peer(&proof);
                self.metrics.proofs_registered.inc();
                debug!(
                    proof = %proofid,
                    peer,
                    score = proof.score(),
                    evicted = evicted.len(),
                    "proof registered"
                );
                Ok(Registration::Registered { peer })
            }
            AddProofStatus::Rejected => {
                if self.park(&proof) {
                    self.metrics.proofs_conflicting.inc();
                    debug!(proof = %proofid, conflicts = evicted.len(), "proof parked as conflicting");
                    Ok(Registration::Conflicting)
                } else {
                    debug!(proof = %proofid, conflicts = evicted.len(), "conflicting proof dropped");
                    Ok(Registration::Dropped)
                }
            }
            AddProofStatus::Duplicated => {
                self.metrics.proofs_duplicated.inc();
                Ok(Registration::AlreadyRegistered)
            }
        }
    }

    /// Offer a proof to the conflicting pool and return whether it is still
    /// parked afterwards.
    ///
    /// Weaker parked proofs it collides with are dropped, then the lowest
    /// scoring parked proofs while the pool is over capacity.
    fn park(&mut self, proof: &ProofRef) -> bool {
        let mut displaced = ConflictingProofSet::new();
        match self.conflicting.add_proof_if_preferred(proof, &mut displaced) {
            AddProofStatus::Rejected => {
                self.metrics.proofs_dropped.inc();
                return false;
            }
            AddProofStatus::Duplicated => return true,
            AddProofStatus::Succeed => {}
        }

        if !displaced.is_empty() {
            self.metrics.proofs_dropped.inc_by(displaced.len() as u64);
            trace!(proof = %proof.id(), dropped = displaced.len(), "parked proofs displaced");
        }

        while self.conflicting.count_proofs() > self.params.max_conflicting_proofs {
            let Some(lowest) = self.conflicting.lowest_score_proof() else {
                break;
            };
            self.conflicting.remove_proof(lowest.id());
            self.metrics.proofs_dropped.inc();
            debug!(
                proof = %lowest.id(),
                score = lowest.score(),
                capacity = self.params.max_conflicting_proofs,
                "conflicting pool full, lowest score proof dropped"
            );
        }

        self.conflicting.contains(proof.id())
    }

    fn attach_peer(&mut self, proof: &ProofRef) -> usize {
        let score = u64::from(proof.score());
        if let Some(&peer) = self.peer_by_proof.get(proof.id()) {
            self.peers.rescore_peer(peer, score);
            self.proof_by_peer[peer] = Some(Arc::clone(proof));
            return peer;
        }

        let peer = match self.free_peers.pop() {
            Some(peer) => {
                self.peers.rescore_peer(peer, score);
                self.proof_by_peer[peer] = Some(Arc::clone(proof));
                peer
            }
            None => {
                let peer = self.peers.add_peer(score);
                debug_assert_eq!(peer, self.proof_by_peer.len());
                self.proof_by_peer.push(Some(Arc::clone(proof)));
                peer
            }
        };
        self.peer_by_proof.insert(*proof.id(), peer);
        peer
    }

    fn detach_peer(&mut self, proofid: &ProofId) {
        if let Some(peer) = self.peer_by_proof.remove(proofid) {
            self.peers.remove_peer(peer);
            self.proof_by_peer[peer] = None;
            self.free_peers.push(peer);
            trace!(proof = %proofid, peer, "peer removed");
        }
    }

    /// Hand every conflicting proof back to [`Inner::register`].
    fn rescan_conflicting(&mut self) -> usize {
        let mut parked = std::mem::take(&mut self.conflicting);
        parked.rescan(self)
    }

    fn refresh_gauges(&self) {
        let m = &self.metrics;
        m.valid_proofs.set(gauge(self.valid.count_proofs() as u64));
        m.conflicting_proofs.set(gauge(self.conflicting.count_proofs() as u64));
        m.live_peers.set(gauge(self.peer_by_proof.len() as u64));
        m.slot_count.set(gauge(self.peers.slot_count()));
        m.fragmentation.set(gauge(self.peers.fragmentation()));
    }
}

impl ProofRegistrar for Inner {
    fn register_proof(&mut self, proof: ProofRef) -> bool {
        match self.register(proof) {
            Ok(Registration::Registered { .. }) => true,
            Ok(_) => false,
            Err(err) => {
                warn!(%err, "proof dropped during rescan");
                false
            }
        }
    }
}

fn gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Registers proofs, resolves their stake conflicts and selects peers
/// proportionally to stake.
pub struct Processor {
    inner: Mutex<Inner>,
    metrics: Arc<AvalancheMetrics>,
}

impl Processor {
    /// A processor drawing selection randomness from an OS-seeded generator.
    pub fn new(config: NodeConfig) -> Self {
        Self::with_slot_source(config, Box::new(RngSlotSource(StdRng::from_entropy())))
    }

    /// A processor drawing selection randomness from `source`.
    pub fn with_slot_source(config: NodeConfig, source: Box<dyn SlotSource + Send>) -> Self {
        let params = config.params;
        let metrics = Arc::new(AvalancheMetrics::new());
        let inner = Inner {
            valid: ProofPool::new(),
            conflicting: ProofPool::new(),
            peers: PeerManager::with_params(
                params.select_peer_max_retry,
                params.compaction_threshold_percent,
            ),
            peer_by_proof: HashMap::new(),
            proof_by_peer: Vec::new(),
            free_peers: Vec::new(),
            source,
            params,
            metrics: Arc::clone(&metrics),
        };
        Self {
            inner: Mutex::new(inner),
            metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("processor lock poisoned")
    }

    /// Register a proof, evicting weaker valid proofs it conflicts with.
    pub fn register_proof(&self, proof: ProofRef) -> Result<Registration, NodeError> {
        let mut inner = self.lock();
        let result = inner.register(proof);
        inner.refresh_gauges();
        result
    }

    /// Drop a proof from whichever pool holds it.
    ///
    /// When a valid proof goes away its stakes are freed, so the conflicting
    /// proofs are rescanned and the best of them take its place.
    pub fn reject_proof(&self, proofid: &ProofId) -> bool {
        let mut inner = self.lock();

        let removed = if inner.valid.remove_proof(proofid) {
            inner.detach_peer(proofid);
            let rescanned = inner.rescan_conflicting();
            debug!(proof = %proofid, rescanned, "valid proof rejected");
            true
        } else if inner.conflicting.remove_proof(proofid) {
            debug!(proof = %proofid, "conflicting proof rejected");
            true
        } else {
            false
        };

        inner.refresh_gauges();
        removed
    }

    /// Resubmit every pooled proof, valid ones first, then compact slot space.
    ///
    /// Returns the number of proofs resubmitted.
    pub fn rescan(&self) -> usize {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let mut valid = std::mem::take(&mut inner.valid);
        let mut count = valid.rescan(inner);
        count += inner.rescan_conflicting();
        let reclaimed = inner.peers.compact();

        inner.refresh_gauges();
        info!(
            proofs = count,
            valid = inner.valid.count_proofs(),
            conflicting = inner.conflicting.count_proofs(),
            reclaimed,
            "processor rescanned"
        );
        count
    }

    /// Pick a valid proof with probability proportional to its score.
    pub fn select_peer(&self) -> Option<ProofRef> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        match inner.peers.select_peer(&mut inner.source) {
            Some(peer) => inner.proof_by_peer.get(peer).cloned().flatten(),
            None => {
                if inner.peers.slot_count() > inner.peers.fragmentation() {
                    self.metrics.peer_selection_misses.inc();
                }
                None
            }
        }
    }

    /// Look a proof up in either pool.
    pub fn get_proof(&self, proofid: &ProofId) -> Option<ProofRef> {
        let inner = self.lock();
        inner
            .valid
            .get_proof(proofid)
            .or_else(|| inner.conflicting.get_proof(proofid))
    }

    pub fn is_valid(&self, proofid: &ProofId) -> bool {
        self.lock().valid.contains(proofid)
    }

    pub fn is_conflicting(&self, proofid: &ProofId) -> bool {
        self.lock().conflicting.contains(proofid)
    }

    /// The peer backed by `proofid`, if the proof is valid.
    pub fn peer_of(&self, proofid: &ProofId) -> Option<usize> {
        self.lock().peer_by_proof.get(proofid).copied()
    }

    /// Number of peers with a valid proof attached.
    pub fn peer_count(&self) -> usize {
        self.lock().peer_by_proof.len()
    }

    pub fn slot_count(&self) -> u64 {
        self.lock().peers.slot_count()
    }

    pub fn fragmentation(&self) -> u64 {
        self.lock().peers.fragmentation()
    }

    pub fn metrics(&self) -> &AvalancheMetrics {
        &self.metrics
    }
}
