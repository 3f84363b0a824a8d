//! Outpoints: the unique key of one unspent output.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::TxId;

/// A `(transaction id, output index)` pair identifying one UTXO.
///
/// Ordered by transaction id first, then output index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub n: u32,
}

impl OutPoint {
    pub fn new(txid: TxId, n: u32) -> Self {
        Self { txid, n }
    }

    /// Canonical byte encoding: txid followed by the little-endian index.
    pub fn to_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(self.txid.as_bytes());
        out[32..].copy_from_slice(&self.n.to_le_bytes());
        out
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_txid_then_index() {
        let a = OutPoint::new(TxId::new([1; 32]), 9);
        let b = OutPoint::new(TxId::new([2; 32]), 0);
        let c = OutPoint::new(TxId::new([2; 32]), 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn bytes_carry_index() {
        let op = OutPoint::new(TxId::new([7; 32]), 0x0102_0304);
        let bytes = op.to_bytes();
        assert_eq!(&bytes[..32], &[7u8; 32]);
        assert_eq!(&bytes[32..], &[4, 3, 2, 1]);
    }
}
