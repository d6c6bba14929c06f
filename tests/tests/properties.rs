//! Property checks over the store and the reconciliation map.

use pagegraph_mutation::IdMap;
use pagegraph_tests::prelude::*;
use proptest::prelude::*;

fn prop_bag() -> impl Strategy<Value = Props> {
    proptest::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..6).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect()
    })
}

proptest! {
    #[test]
    fn created_vertex_reads_back_unchanged(
        id in "v[0-9]{1,4}",
        label in "[A-Z][a-z]{2,8}",
        props in prop_bag(),
    ) {
        let mut ctx = GraphContext::new(ContextConfig::new("prop"));
        let input = labeled(&id, &label, props);

        ctx.create_vertex(TxnId::UNTRACKED, input.clone()).unwrap();

        let stored = ctx.graph().get_vertex(&VertexId::new(id.as_str())).unwrap();
        prop_assert_eq!(stored, &input);
        prop_assert!(ctx.graph().label_contains(&label, &input.id));
    }

    #[test]
    fn merge_changes_only_supplied_keys(before in prop_bag(), partial in prop_bag()) {
        let mut ctx = GraphContext::new(ContextConfig::new("prop"));
        ctx.create_vertex(TxnId::UNTRACKED, labeled("v", "Block", before.clone())).unwrap();

        ctx.merge_vertex_properties(TxnId::UNTRACKED, &VertexId::new("v"), partial.clone()).unwrap();

        let stored = &ctx.graph().get_vertex(&VertexId::new("v")).unwrap().props;
        for (key, value) in &before {
            if !partial.contains_key(key) {
                prop_assert_eq!(stored.get(key), Some(value));
            }
        }
        for (key, value) in &partial {
            prop_assert_eq!(stored.get(key), Some(value));
        }
    }

    #[test]
    fn rename_chains_resolve_to_the_last_id(len in 1usize..8) {
        let mut ids = IdMap::new();
        for i in 0..len {
            ids.insert(format!("-{i}"), format!("-{}", i + 1));
        }

        for i in 0..len {
            prop_assert_eq!(ids.resolve(&format!("-{i}")), format!("-{len}"));
        }
    }
}
