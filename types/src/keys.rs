//! Key material carried by proofs.
//!
//! Signatures are checked upstream, so keys are opaque bytes here: they only
//! contribute to a proof's identity.

use serde::{Deserialize, Serialize};

/// A 32-byte public key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
