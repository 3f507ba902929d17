//! Property-based tests for chain linkage and Merkle folding.

use proptest::prelude::*;
use serde_json::json;
use statesync_chain::HashChain;
use statesync_chain::merkle::merkle_root;
use std::collections::BTreeMap;

/// Each step picks a parent among the nodes created so far (or none).
fn shape_strategy() -> impl Strategy<Value = Vec<Option<prop::sample::Index>>> {
    prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..40)
}

fn build(shape: &[Option<prop::sample::Index>]) -> HashChain {
    let mut chain = HashChain::new("prop");
    let mut ids: Vec<String> = Vec::new();
    for (i, pick) in shape.iter().enumerate() {
        let parent = match pick {
            Some(index) if !ids.is_empty() => Some(ids[index.index(ids.len())].clone()),
            _ => None,
        };
        let node = chain
            .add_node(&json!({ "n": i }), parent.as_deref(), BTreeMap::new())
            .unwrap();
        ids.push(node.identity_hash().to_string());
    }
    chain
}

proptest! {
    /// Any chain built purely through add_node verifies cleanly.
    #[test]
    fn add_node_chains_always_verify(shape in shape_strategy()) {
        let chain = build(&shape);
        let report = chain.verify_integrity();
        prop_assert!(report.is_valid(), "{:?}", report.errors);
    }

    /// Export followed by import preserves the Merkle root and linkage.
    #[test]
    fn import_preserves_merkle_root(shape in shape_strategy()) {
        let chain = build(&shape);
        let imported = HashChain::import(&chain.export()).unwrap();
        prop_assert_eq!(imported.compute_merkle_root(), chain.compute_merkle_root());
        prop_assert!(imported.verify_integrity().is_valid());
    }

    /// Children recorded on parents add up to the non-root node count.
    #[test]
    fn children_account_for_every_linked_node(shape in shape_strategy()) {
        let chain = build(&shape);
        let children: usize = chain.nodes().iter().map(|n| n.children_hashes().len()).sum();
        let linked = chain.nodes().iter().filter(|n| n.depth() > 0).count();
        prop_assert_eq!(children, linked);
    }

    /// Padding an odd level explicitly never changes the root.
    #[test]
    fn explicit_padding_is_idempotent(leaves in prop::collection::vec("[0-9a-f]{8}", 1..20)) {
        let mut padded = leaves.clone();
        if padded.len() % 2 == 1 && padded.len() > 1 {
            padded.push(padded[padded.len() - 1].clone());
        }
        prop_assert_eq!(merkle_root(leaves), merkle_root(padded));
    }
}
