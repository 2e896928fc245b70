use chainmesh::{Block, Blockchain, MergeOutcome};
use proptest::prelude::*;

const DIFFICULTY: usize = 1;

fn extend(chain: &mut Blockchain, prefix: &str, count: usize) {
    for i in 0..count {
        let block = chain.mine(Block::new(format!("{prefix}-{i}"))).unwrap();
        chain.add(block).unwrap();
    }
}

fn chain_of(prefix: &str, count: usize) -> Blockchain {
    let mut chain = Blockchain::with_difficulty(DIFFICULTY);
    extend(&mut chain, prefix, count);
    chain
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn mined_chains_are_valid_and_indexed(count in 0usize..12) {
        let chain = chain_of("p", count);
        prop_assert!(chain.is_valid());
        prop_assert_eq!(chain.len(), count);
        for (i, block) in chain.blocks().iter().enumerate() {
            prop_assert_eq!(chain.index_of(&block.hash()), Some(i));
            prop_assert!(chain.contains_payload(&block.data));
        }
    }

    #[test]
    fn tampering_a_linked_block_breaks_validity(count in 2usize..10, pick in any::<prop::sample::Index>()) {
        let chain = chain_of("t", count);
        let target = pick.index(count - 1);
        let mut blocks = chain.into_blocks();
        blocks[target].data.push(b'!');

        let mut tampered = Blockchain::with_difficulty(DIFFICULTY);
        let mut rejected = false;
        for block in blocks {
            if tampered.add(block).is_err() {
                rejected = true;
                break;
            }
        }
        prop_assert!(rejected);
    }

    #[test]
    fn merge_prefers_longer_suffix(shared in 0usize..4, local_extra in 0usize..5, remote_extra in 0usize..5) {
        let mut local = chain_of("base", shared);
        let mut remote = local.clone();
        extend(&mut local, "local", local_extra);
        extend(&mut remote, "remote", remote_extra);
        let before = local.clone();

        let outcome = local.merge_chain(remote.blocks().to_vec());
        if remote_extra > local_extra {
            prop_assert!(outcome.is_merged());
            prop_assert_eq!(local.blocks(), remote.blocks());
            if let MergeOutcome::Merged { discarded, .. } = outcome {
                prop_assert_eq!(discarded.len(), local_extra);
            }
        } else {
            prop_assert_eq!(outcome, MergeOutcome::Unchanged);
            prop_assert_eq!(&local, &before);
        }
        prop_assert!(local.is_valid());
    }

    #[test]
    fn popping_unindexes_payloads(count in 1usize..8, pops in 1usize..8) {
        let mut chain = chain_of("pop", count);
        let pops = pops.min(count);
        for _ in 0..pops {
            let block = chain.pop().unwrap();
            prop_assert!(!chain.contains_payload(&block.data));
            prop_assert!(!chain.contains_block(&block.hash()));
        }
        prop_assert_eq!(chain.len(), count - pops);
        prop_assert!(chain.is_valid());
    }
}

#[test]
fn test_decoded_transfer_matches_sender() {
    let chain = chain_of("wire", 5);
    let decoded = Blockchain::decode(&chain.encode(), DIFFICULTY).unwrap();
    assert_eq!(decoded, chain);

    let encoded = chain.encode();
    assert!(Blockchain::decode(&encoded[..encoded.len() - 1], DIFFICULTY).is_err());
}
