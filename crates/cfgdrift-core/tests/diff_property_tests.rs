#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cfgdrift_core::model::{
    Classification, ConfigNode, ConfigTree, DeltaOp, NodeKind, VendorTag,
};
use cfgdrift_core::{apply_plan, classify_all, diff, synthesize, ClassifyContext, RuleTable};
use common::*;
use proptest::prelude::*;
use proptest::sample::subsequence;

const KEYS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

#[derive(Debug, Clone)]
struct Shape {
    acl: Vec<&'static str>,
    vlans: Vec<&'static str>,
    hostname: String,
    mtu: u16,
    description: Option<String>,
    rules: Vec<(&'static str, bool)>,
}

fn shape() -> impl Strategy<Value = Shape> {
    (
        subsequence(KEYS.to_vec(), 0..=8).prop_shuffle(),
        subsequence(KEYS.to_vec(), 0..=8).prop_shuffle(),
        "[a-c]{1,3}",
        prop::sample::select(vec![1500u16, 9000]),
        prop::option::of("[x-z]{1,4}"),
        subsequence(KEYS.to_vec(), 0..=5).prop_shuffle(),
        prop::collection::vec(any::<bool>(), 5),
    )
        .prop_map(
            |(acl, vlans, hostname, mtu, description, rule_names, actions)| Shape {
                acl,
                vlans,
                hostname,
                mtu,
                description,
                rules: rule_names.into_iter().zip(actions).collect(),
            },
        )
}

fn build(shape: &Shape) -> ConfigTree {
    let rules = ConfigNode::ordered_list(
        path(&["rules"]),
        shape.rules.iter().map(|(name, allow)| {
            map(name, vec![leaf("action", if *allow { "allow" } else { "deny" })])
        }),
    );
    let mut iface = vec![leaf("mtu", &shape.mtu.to_string())];
    if let Some(description) = &shape.description {
        iface.push(leaf("description", description));
    }
    ios_tree(vec![
        list("acl", &shape.acl),
        set("vlans", &shape.vlans),
        leaf("hostname", &shape.hostname),
        map("interface Gi0/1", iface),
        rules,
    ])
}

proptest! {
    #[test]
    fn prop_diff_of_identical_trees_is_empty(s in shape()) {
        let t = build(&s);
        prop_assert!(diff(&t, &t).unwrap().is_empty());
    }

    #[test]
    fn prop_diff_is_deterministic(a in shape(), b in shape()) {
        let (a, b) = (build(&a), build(&b));
        let first = serde_json::to_vec(&diff(&a, &b).unwrap()).unwrap();
        let second = serde_json::to_vec(&diff(&a, &b).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_rollback_restores_before(a in shape(), b in shape()) {
        let (a, b) = (build(&a), build(&b));
        let plan = synthesize(&diff(&a, &b).unwrap());
        prop_assert!(plan.is_complete());
        let restored = apply_plan(&b, &plan).unwrap();
        prop_assert_eq!(restored.root(), a.root());
    }

    #[test]
    fn prop_set_permutation_is_invisible(s in shape(), reversed in any::<bool>()) {
        let a = build(&s);
        let mut permuted = s.clone();
        if reversed {
            permuted.vlans.reverse();
        } else {
            permuted.vlans.sort_unstable();
        }
        prop_assert!(diff(&a, &build(&permuted)).unwrap().is_empty());
    }

    #[test]
    fn prop_every_entry_gets_classified(a in shape(), b in shape()) {
        let (a, b) = (build(&a), build(&b));
        let table = RuleTable::builtin().unwrap();
        let classified = classify_all(
            diff(&a, &b).unwrap(),
            &table,
            &ClassifyContext::new(VendorTag::CiscoIos),
        );
        prop_assert!(classified
            .entries
            .iter()
            .all(|e| e.classification != Classification::Unclassified));
    }

    #[test]
    fn prop_moves_only_on_ordered_lists(a in shape(), b in shape()) {
        let (a, b) = (build(&a), build(&b));
        for entry in diff(&a, &b).unwrap().entries {
            if entry.op == DeltaOp::Moved {
                let parent = entry.path.parent().unwrap();
                prop_assert_eq!(b.get(&parent).unwrap().kind(), NodeKind::OrderedList);
            }
        }
    }
}
