//! Nullable registrar: records the proofs a rescan hands back.

use avalanche_consensus::ProofRegistrar;
use avalanche_types::{ProofId, ProofRef};

/// A proof registrar that keeps every proof it is given.
#[derive(Debug)]
pub struct NullRegistrar {
    registered: Vec<ProofRef>,
    accept: bool,
}

impl NullRegistrar {
    /// A registrar accepting every proof.
    pub fn new() -> Self {
        Self {
            registered: Vec::new(),
            accept: true,
        }
    }

    /// A registrar that records proofs but reports each as refused.
    pub fn refusing() -> Self {
        Self {
            registered: Vec::new(),
            accept: false,
        }
    }

    /// Proofs received, in call order.
    pub fn registered(&self) -> &[ProofRef] {
        &self.registered
    }

    /// How many times `id` was handed over.
    pub fn count(&self, id: &ProofId) -> usize {
        self.registered.iter().filter(|p| p.id() == id).count()
    }
}

impl Default for NullRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofRegistrar for NullRegistrar {
    fn register_proof(&mut self, proof: ProofRef) -> bool {
        self.registered.push(proof);
        self.accept
    }
}
