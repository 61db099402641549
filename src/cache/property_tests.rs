//! Property-Based Tests for the Cache Module
//!
//! Uses proptest to verify storage, eviction and key-derivation properties
//! over generated operation sequences.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::convert::Infallible;

use proptest::prelude::*;

use crate::cache::CacheStore;
use crate::key::{CacheKey, KeyBuilder};

// == Test Configuration ==
const TEST_CALLABLE: &str = "prop_fn";

fn derive_key(tag: &str) -> CacheKey {
    KeyBuilder::new(TEST_CALLABLE)
        .arg(&tag)
        .unwrap()
        .build()
        .unwrap()
}

// == Strategies ==
/// Generates short argument tags; a small alphabet keeps key collisions
/// (intentional re-use of the same call) frequent.
fn tag_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,4}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}".prop_map(|s| s)
}

/// A sequence of memoization operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Compute { tag: String, value: String },
    Lookup { tag: String },
    Remove { tag: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (tag_strategy(), value_strategy())
            .prop_map(|(tag, value)| CacheOp::Compute { tag, value }),
        tag_strategy().prop_map(|tag| CacheOp::Lookup { tag }),
        tag_strategy().prop_map(|tag| CacheOp::Remove { tag }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, hit/miss counters reflect exactly the
    // lookups that found (or did not find) a live entry, and the entry count
    // matches the store length.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store: CacheStore<String> = CacheStore::new(None, None);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Compute { tag, value } => {
                    // get_or_compute performs a lookup internally
                    let key = derive_key(&tag);
                    let present = store.entry_meta(&key).is_some();
                    if present {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                    let _ = store.get_or_compute(&key, || -> Result<String, Infallible> {
                        Ok(value.clone())
                    });
                }
                CacheOp::Lookup { tag } => {
                    match store.lookup(&derive_key(&tag)) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Remove { tag } => {
                    let _ = store.remove(&derive_key(&tag));
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "total entries mismatch");
    }

    // For any value, memoizing it and looking it up returns the same value.
    #[test]
    fn prop_roundtrip_storage(tag in tag_strategy(), value in value_strategy()) {
        let mut store: CacheStore<String> = CacheStore::new(None, None);
        let key = derive_key(&tag);

        let computed = store
            .get_or_compute(&key, || -> Result<String, Infallible> { Ok(value.clone()) })
            .unwrap();
        prop_assert_eq!(&computed, &value);

        let retrieved = store.lookup(&key);
        prop_assert_eq!(retrieved, Some(value));
    }

    // For any removed key, the next lookup misses.
    #[test]
    fn prop_remove_forces_miss(tag in tag_strategy(), value in value_strategy()) {
        let mut store: CacheStore<String> = CacheStore::new(None, None);
        let key = derive_key(&tag);

        store.insert(key.clone(), value);
        prop_assert!(store.lookup(&key).is_some());

        store.remove(&key);
        prop_assert!(store.lookup(&key).is_none());
    }

    // For any sequence of inserts, the store never exceeds its capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((tag_strategy(), value_strategy()), 1..100)
    ) {
        let max_entries = 10;
        let mut store: CacheStore<String> = CacheStore::new(Some(max_entries), None);

        for (tag, value) in entries {
            store.insert(derive_key(&tag), value);
            prop_assert!(
                store.len() <= max_entries,
                "store size {} exceeds max {}",
                store.len(),
                max_entries
            );
        }
    }

    // Filling the store to capacity and inserting one more key evicts
    // exactly the least recently used entry.
    #[test]
    fn prop_lru_eviction_order(
        initial_tags in prop::collection::vec(tag_strategy(), 3..8),
        new_tag in "[A-Z]{2}",
    ) {
        let unique_tags: Vec<String> = initial_tags
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(unique_tags.len() >= 2);

        let capacity = unique_tags.len();
        let mut store: CacheStore<String> = CacheStore::new(Some(capacity), None);

        let oldest_key = derive_key(&unique_tags[0]);
        for tag in &unique_tags {
            store.insert(derive_key(tag), format!("value_{tag}"));
        }
        prop_assert_eq!(store.len(), capacity);

        // the uppercase alphabet guarantees new_tag is a fresh key
        store.insert(derive_key(&new_tag), "new".to_string());

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(
            store.lookup(&oldest_key).is_none(),
            "oldest key `{}` should have been evicted",
            unique_tags[0]
        );
        for tag in unique_tags.iter().skip(1) {
            prop_assert!(store.lookup(&derive_key(tag)).is_some());
        }
    }

    // A looked-up key is promoted and survives the next eviction.
    #[test]
    fn prop_lru_access_tracking(
        tags in prop::collection::vec(tag_strategy(), 3..8),
        new_tag in "[A-Z]{2}",
    ) {
        let unique_tags: Vec<String> = tags
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(unique_tags.len() >= 3);

        let capacity = unique_tags.len();
        let mut store: CacheStore<String> = CacheStore::new(Some(capacity), None);

        for tag in &unique_tags {
            store.insert(derive_key(tag), format!("value_{tag}"));
        }

        // promote the eviction candidate; the second-oldest becomes next
        let promoted = derive_key(&unique_tags[0]);
        let expected_evicted = derive_key(&unique_tags[1]);
        let _ = store.lookup(&promoted);

        store.insert(derive_key(&new_tag), "new".to_string());

        prop_assert!(store.lookup(&promoted).is_some(), "promoted key was evicted");
        prop_assert!(
            store.lookup(&expected_evicted).is_none(),
            "expected `{}` to be evicted",
            unique_tags[1]
        );
    }
}

// Key-derivation properties over generated argument shapes
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Keyword arguments derive the same key no matter the order they were
    // added in.
    #[test]
    fn prop_kwarg_order_invariance(
        pairs in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..6)
    ) {
        let forward = pairs.iter().fold(KeyBuilder::new("f"), |builder, (name, value)| {
            builder.kwarg(name.clone(), value).unwrap()
        });
        let reverse = pairs.iter().rev().fold(KeyBuilder::new("f"), |builder, (name, value)| {
            builder.kwarg(name.clone(), value).unwrap()
        });

        prop_assert_eq!(forward.build().unwrap(), reverse.build().unwrap());
    }

    // Derivation is a pure function of the arguments.
    #[test]
    fn prop_key_derivation_deterministic(
        args in prop::collection::vec(any::<i64>(), 0..5),
        kwargs in prop::collection::btree_map("[a-z]{1,6}", value_strategy(), 0..4)
    ) {
        let build = |args: &[i64], kwargs: &BTreeMap<String, String>| {
            let mut builder = KeyBuilder::new("f");
            for arg in args {
                builder = builder.arg(arg).unwrap();
            }
            for (name, value) in kwargs {
                builder = builder.kwarg(name.clone(), value).unwrap();
            }
            builder.build().unwrap()
        };

        prop_assert_eq!(build(&args, &kwargs), build(&args, &kwargs));
    }

    // Distinct positional arguments derive distinct keys.
    #[test]
    fn prop_key_discrimination(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);

        let ka = KeyBuilder::new("f").arg(&a).unwrap().build().unwrap();
        let kb = KeyBuilder::new("f").arg(&b).unwrap().build().unwrap();
        prop_assert_ne!(ka, kb);
    }
}
