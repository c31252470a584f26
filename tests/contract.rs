//! Contract tests run against every container kind through the trait object.

use ordered_containers::{
    AvlTree, BPlusTree, ContainerConfig, ContainerKind, HashTable, HashTableConfig,
    OrderedContainer, RbTree,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

type Boxed = Box<dyn OrderedContainer<u64, String>>;

fn build(kind: ContainerKind) -> Boxed {
    kind.build(&ContainerConfig::default()).unwrap()
}

fn shuffled_keys(n: u64, seed: u64) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..n).map(|k| k * 3 + 1).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

fn keys_of(container: &dyn OrderedContainer<u64, String>) -> Vec<u64> {
    let mut out = Vec::new();
    container.traverse(&mut |k, _| out.push(*k));
    out
}

#[test]
fn size_counts_distinct_keys() {
    for kind in ContainerKind::ALL {
        let mut c = build(kind);
        let keys = shuffled_keys(500, 1);
        for &k in &keys {
            assert!(c.insert(k, format!("v{}", k)), "{}", kind);
        }
        assert_eq!(c.len(), 500, "{}", kind);

        assert!(!c.insert(keys[7], "updated".to_string()), "{}", kind);
        assert_eq!(c.len(), 500, "{}", kind);
        assert_eq!(c.search(&keys[7]).map(String::as_str), Some("updated"), "{}", kind);
    }
}

#[test]
fn traverse_is_strictly_ascending() {
    for kind in ContainerKind::ALL {
        let mut c = build(kind);
        for k in shuffled_keys(800, 2) {
            c.insert(k, String::new());
        }
        let keys = keys_of(c.as_ref());
        assert_eq!(keys.len(), 800, "{}", kind);
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "{}", kind);
    }
}

#[test]
fn export_and_reinsert_reproduces_contents() {
    for kind in ContainerKind::ALL {
        let mut original = build(kind);
        for k in shuffled_keys(300, 3) {
            original.insert(k, format!("v{}", k));
        }
        for k in shuffled_keys(100, 4) {
            original.delete(&k);
        }

        let mut exported = original.entries();
        exported.shuffle(&mut StdRng::seed_from_u64(5));
        let mut copy = build(kind);
        for (k, v) in exported {
            copy.insert(k, v);
        }

        assert_eq!(copy.len(), original.len(), "{}", kind);
        for k in 0..1000u64 {
            assert_eq!(copy.search(&k), original.search(&k), "{} key {}", kind, k);
        }
        assert_eq!(copy.range(&50, &600), original.range(&50, &600), "{}", kind);
    }
}

#[test]
fn range_matches_filtered_keys() {
    let mut rng = StdRng::seed_from_u64(6);
    for kind in ContainerKind::ALL {
        let mut c = build(kind);
        let keys = shuffled_keys(400, 7);
        for &k in &keys {
            c.insert(k, format!("v{}", k));
        }
        let mut sorted = keys.clone();
        sorted.sort_unstable();

        for _ in 0..50 {
            let a = rng.gen_range(0..1300u64);
            let b = a + rng.gen_range(0..200u64);
            let got: Vec<u64> = c.range(&a, &b).into_iter().map(|(k, _)| *k).collect();
            let expected: Vec<u64> =
                sorted.iter().copied().filter(|k| (a..=b).contains(k)).collect();
            assert_eq!(got, expected, "{} range({}, {})", kind, a, b);
        }

        // A single present key, a gap between keys and an inverted range.
        assert_eq!(c.range(&4, &4).len(), 1, "{}", kind);
        assert!(c.range(&5, &6).is_empty(), "{}", kind);
        assert!(c.range(&100, &10).is_empty(), "{}", kind);
        let (k, v) = c.range(&4, &4)[0];
        assert_eq!((*k, v.as_str()), (4, "v4"), "{}", kind);
    }
}

#[test]
fn deleting_absent_key_changes_nothing() {
    for kind in ContainerKind::ALL {
        let mut c = build(kind);
        assert!(!c.delete(&10), "{}", kind);
        for k in [10u64, 20, 30] {
            c.insert(k, k.to_string());
        }
        assert!(c.delete(&20), "{}", kind);
        assert!(!c.delete(&20), "{}", kind);
        assert!(!c.delete(&25), "{}", kind);
        assert_eq!(c.len(), 2, "{}", kind);
        assert_eq!(keys_of(c.as_ref()), vec![10, 30], "{}", kind);
        assert!(!c.contains(&20), "{}", kind);
    }
}

#[test]
fn drain_leaves_empty_container() {
    for kind in ContainerKind::ALL {
        let mut c = build(kind);
        let keys = shuffled_keys(600, 8);
        for &k in &keys {
            c.insert(k, String::new());
        }
        for k in shuffled_keys(600, 9) {
            assert!(c.delete(&k), "{} key {}", kind, k);
            assert!(c.search(&k).is_none(), "{}", kind);
        }
        assert!(c.is_empty(), "{}", kind);
        assert!(keys_of(c.as_ref()).is_empty(), "{}", kind);
    }
}

#[test]
fn string_keys_sort_lexicographically() {
    let words = ["walnut", "apple", "Zebra", "banana", "apricot", "cherry"];
    for kind in ContainerKind::ALL {
        let mut c: Box<dyn OrderedContainer<String, usize>> =
            kind.build(&ContainerConfig::default()).unwrap();
        for (i, w) in words.iter().enumerate() {
            c.insert(w.to_string(), i);
        }
        let mut seen = Vec::new();
        c.traverse(&mut |k, _| seen.push(k.clone()));
        assert_eq!(seen, ["Zebra", "apple", "apricot", "banana", "cherry", "walnut"], "{}", kind);
        let ranged: Vec<&str> = c
            .range(&"ap".to_string(), &"b".to_string())
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(ranged, ["apple", "apricot"], "{}", kind);
    }
}

#[test]
fn red_black_scenario_in_order() {
    let mut tree = RbTree::new();
    for k in [50u32, 30, 70, 20, 40, 60, 80] {
        tree.insert(k, ());
    }
    let mut keys = Vec::new();
    tree.traverse(|k, _| keys.push(*k));
    assert_eq!(keys, vec![20, 30, 40, 50, 60, 70, 80]);
}

#[test]
fn avl_ascending_height_bound() {
    let mut tree = AvlTree::new();
    for k in 1..=1000u32 {
        tree.insert(k, k);
    }
    let bound = (1.44 * (1002f64).log2()).ceil() as usize;
    assert!(tree.height() <= bound, "height {} > {}", tree.height(), bound);
}

#[test]
fn bplus_range_over_linked_leaves() {
    let mut tree: BPlusTree<u32, String, 5> = BPlusTree::new();
    for k in 1..=20u32 {
        tree.insert(k, format!("v{}", k));
    }
    let got: Vec<(u32, String)> = tree
        .range(&5, &12)
        .into_iter()
        .map(|(k, v)| (*k, v.clone()))
        .collect();
    let expected: Vec<(u32, String)> = (5..=12).map(|k| (k, format!("v{}", k))).collect();
    assert_eq!(got, expected);
}

#[test]
fn hash_table_capacity_after_growth() {
    let config = HashTableConfig {
        initial_capacity: 16,
        load_factor: 0.75,
    };
    let mut table = HashTable::try_with_config(config).unwrap();
    let mut rng = StdRng::seed_from_u64(10);
    let mut inserted = Vec::new();
    while inserted.len() < 1000 {
        let k = rng.gen::<u64>();
        if table.insert(k, k).is_none() {
            inserted.push(k);
        }
    }
    assert_eq!(table.capacity(), 2048);
    assert!(inserted.iter().all(|k| table.get(k) == Some(k)));
}
