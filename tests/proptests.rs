//! Property-based tests for every container kind.
//!
//! Uses differential testing against `BTreeMap` as an oracle.

use ordered_containers::{ContainerConfig, ContainerKind, OrderedContainer};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
//  Strategies
// ============================================================================

/// Operations for random testing. A small key space forces collisions
/// between inserts, updates and deletes.
#[derive(Debug, Clone)]
enum Op {
    Insert(i32, u32),
    Delete(i32),
    Search(i32),
    Range(i32, i32),
}

fn small_key() -> impl Strategy<Value = i32> {
    -150..150i32
}

fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            4 => (small_key(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            3 => small_key().prop_map(Op::Delete),
            2 => small_key().prop_map(Op::Search),
            1 => (small_key(), small_key()).prop_map(|(a, b)| Op::Range(a, b)),
        ],
        0..=max_ops,
    )
}

fn kind() -> impl Strategy<Value = ContainerKind> {
    prop::sample::select(ContainerKind::ALL.to_vec())
}

fn contents(c: &dyn OrderedContainer<i32, u32>) -> Vec<(i32, u32)> {
    let mut out = Vec::new();
    c.traverse(&mut |k, v| out.push((*k, *v)));
    out
}

// ============================================================================
//  Differential Testing Against BTreeMap
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random operation sequences should match BTreeMap behavior.
    #[test]
    fn differential_random_ops(kind in kind(), ops in operations(400)) {
        let mut c = kind.build::<i32, u32>(&ContainerConfig::default()).unwrap();
        let mut oracle: BTreeMap<i32, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let created = c.insert(key, value);
                    let oracle_old = oracle.insert(key, value);
                    prop_assert_eq!(created, oracle_old.is_none(), "{} insert {}", kind, key);
                }
                Op::Delete(key) => {
                    prop_assert_eq!(
                        c.delete(&key),
                        oracle.remove(&key).is_some(),
                        "{} delete {}",
                        kind,
                        key
                    );
                }
                Op::Search(key) => {
                    prop_assert_eq!(c.search(&key), oracle.get(&key), "{} search {}", kind, key);
                }
                Op::Range(a, b) => {
                    let got: Vec<(i32, u32)> =
                        c.range(&a, &b).into_iter().map(|(k, v)| (*k, *v)).collect();
                    let expected: Vec<(i32, u32)> = if a <= b {
                        oracle.range(a..=b).map(|(k, v)| (*k, *v)).collect()
                    } else {
                        Vec::new()
                    };
                    prop_assert_eq!(got, expected, "{} range({}, {})", kind, a, b);
                }
            }
            prop_assert_eq!(c.len(), oracle.len(), "{} length", kind);
        }

        let expected: Vec<(i32, u32)> = oracle.into_iter().collect();
        prop_assert_eq!(contents(c.as_ref()), expected, "{} final contents", kind);
    }

    /// Inserting the same pairs in any order yields the same contents.
    #[test]
    fn insertion_order_does_not_matter(
        kind in kind(),
        pairs in prop::collection::vec((small_key(), any::<u32>()), 0..200),
        seed in any::<u64>()
    ) {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        // Last write wins, so dedupe before shuffling.
        let unique: BTreeMap<i32, u32> = pairs.into_iter().collect();
        let mut shuffled: Vec<(i32, u32)> = unique.iter().map(|(k, v)| (*k, *v)).collect();
        shuffled.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));

        let mut c = kind.build::<i32, u32>(&ContainerConfig::default()).unwrap();
        for (k, v) in shuffled {
            prop_assert!(c.insert(k, v));
        }
        let expected: Vec<(i32, u32)> = unique.into_iter().collect();
        prop_assert_eq!(contents(c.as_ref()), expected);
    }
}
