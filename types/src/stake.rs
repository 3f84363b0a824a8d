//! A stake: one UTXO committed to a proof.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::keys::PublicKey;
use crate::outpoint::OutPoint;

/// A claim over one unspent output.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stake {
    utxo: OutPoint,
    amount: Amount,
    /// Height of the block that created the output.
    height: u32,
    is_coinbase: bool,
    /// Key owning the staked output.
    pubkey: PublicKey,
}

impl Stake {
    pub fn new(
        utxo: OutPoint,
        amount: Amount,
        height: u32,
        is_coinbase: bool,
        pubkey: PublicKey,
    ) -> Self {
        Self {
            utxo,
            amount,
            height,
            is_coinbase,
            pubkey,
        }
    }

    /// The outpoint this stake claims.
    pub fn utxo(&self) -> &OutPoint {
        &self.utxo
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_coinbase(&self) -> bool {
        self.is_coinbase
    }

    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    /// Append the canonical encoding of this stake to `buf`.
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.utxo.to_bytes());
        buf.extend_from_slice(&self.amount.sats().to_le_bytes());
        // Height and coinbase flag share one word, coinbase in the low bit.
        let height_and_coinbase = (self.height << 1) | u32::from(self.is_coinbase);
        buf.extend_from_slice(&height_and_coinbase.to_le_bytes());
        buf.extend_from_slice(self.pubkey.as_bytes());
    }
}
