use proptest::prelude::*;

use avalanche_types::{Amount, OutPoint, ProofBuilder, PublicKey, Stake, TxId};

fn stake_from(tag: u8, n: u32, coins: u64) -> Stake {
    Stake::new(
        OutPoint::new(TxId::new([tag; 32]), n),
        Amount::from_coins(coins),
        1,
        false,
        PublicKey([tag; 32]),
    )
}

/// Up to 16 stakes over distinct outpoints.
fn distinct_stakes() -> impl Strategy<Value = Vec<Stake>> {
    prop::collection::btree_map((any::<u8>(), 0u32..4), 1u64..1_000, 1..16).prop_map(|m| {
        m.into_iter()
            .map(|((tag, n), coins)| stake_from(tag, n, coins))
            .collect()
    })
}

proptest! {
    /// The proof id depends on the stake set, not the order stakes were added.
    #[test]
    fn proof_id_is_order_independent(stakes in distinct_stakes(), seed in any::<u64>()) {
        let mut shuffled = stakes.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let a = stakes
            .into_iter()
            .fold(ProofBuilder::new(7, 0, PublicKey([1; 32])), ProofBuilder::add_stake)
            .build()
            .unwrap();
        let b = shuffled
            .into_iter()
            .fold(ProofBuilder::new(7, 0, PublicKey([1; 32])), ProofBuilder::add_stake)
            .build()
            .unwrap();
        prop_assert_eq!(a.id(), b.id());
        prop_assert_eq!(a.stakes(), b.stakes());
    }

    /// Staked amount is the sum of stake amounts and the stakes come out sorted.
    #[test]
    fn staked_amount_is_sum(stakes in distinct_stakes()) {
        let expected: u64 = stakes.iter().map(|s| s.amount().sats()).sum();
        let proof = stakes
            .into_iter()
            .fold(ProofBuilder::new(0, 0, PublicKey([2; 32])), ProofBuilder::add_stake)
            .build()
            .unwrap();
        prop_assert_eq!(proof.staked_amount().sats(), expected);
        prop_assert!(proof.stakes().windows(2).all(|w| w[0].utxo() < w[1].utxo()));
    }

    /// OutPoint ordering agrees with the (txid, index) tuple ordering.
    #[test]
    fn outpoint_ordering(a in any::<[u8; 32]>(), b in any::<[u8; 32]>(), n in any::<u32>(), m in any::<u32>()) {
        let x = OutPoint::new(TxId::new(a), n);
        let y = OutPoint::new(TxId::new(b), m);
        prop_assert_eq!(x.cmp(&y), (a, n).cmp(&(b, m)));
    }
}
