//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the key-value store against a plain map model and
//! the entry codec against generated shops.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use crate::cache::{CacheStore, KvCache, MemoryCache};
use crate::codec;
use crate::models::Shop;

// == Test Configuration ==
const LONG_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "(cache|lock):shop:[0-9]{1,2}"
}

/// Includes the empty string, which the engine uses as the null marker
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    SetIfAbsent { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    DeleteIfEquals { key: String, expected: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::SetIfAbsent { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (key_strategy(), value_strategy())
            .prop_map(|(key, expected)| CacheOp::DeleteIfEquals { key, expected }),
    ]
}

fn finite_coord() -> impl Strategy<Value = f64> {
    -180.0f64..180.0f64
}

/// Whole-second timestamps between 2000 and 2100
fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default())
}

prop_compose! {
    fn shop_strategy()(
        id in 1u64..1_000_000,
        name in "[\\PC]{1,24}",
        type_id in 1u64..10,
        images in "[a-z/:.,]{0,40}",
        area in proptest::option::of("[a-zA-Z ]{1,12}"),
        address in "[\\PC]{1,40}",
        x in finite_coord(),
        y in finite_coord(),
        avg_price in proptest::option::of(0u64..10_000),
        sold in any::<u32>(),
        comments in any::<u32>(),
        score in 0u32..=50,
        open_hours in proptest::option::of("[0-9:-]{5,11}"),
        update_time in timestamp_strategy(),
    ) -> Shop {
        Shop {
            id,
            name,
            type_id,
            images,
            area,
            address,
            x,
            y,
            avg_price,
            sold,
            comments,
            score,
            open_hours,
            update_time,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations without expiry, the store behaves like a
    // map where set_if_absent only writes missing keys and delete_if_equals
    // only removes matching values.
    #[test]
    fn prop_store_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(&key, &value, Some(LONG_TTL));
                    model.insert(key, value);
                }
                CacheOp::SetIfAbsent { key, value } => {
                    let stored = store.set_if_absent(&key, &value, LONG_TTL);
                    let expected = !model.contains_key(&key);
                    prop_assert_eq!(stored, expected);
                    if expected {
                        model.insert(key, value);
                    }
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).cloned());
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
                CacheOp::DeleteIfEquals { key, expected } => {
                    let owned = model.get(&key) == Some(&expected);
                    prop_assert_eq!(store.delete_if_equals(&key, &expected), owned);
                    if owned {
                        model.remove(&key);
                    }
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
    }

    // The async backend agrees with the store it wraps.
    #[test]
    fn prop_memory_cache_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let cache = MemoryCache::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    tokio_test::block_on(cache.set(&key, &value, None)).unwrap();
                    model.insert(key, value);
                }
                CacheOp::SetIfAbsent { key, value } => {
                    let stored = tokio_test::block_on(cache.set_if_absent(&key, &value, LONG_TTL)).unwrap();
                    prop_assert_eq!(stored, !model.contains_key(&key));
                    model.entry(key).or_insert(value);
                }
                CacheOp::Get { key } => {
                    let got = tokio_test::block_on(cache.get(&key)).unwrap();
                    prop_assert_eq!(got, model.get(&key).cloned());
                }
                CacheOp::Delete { key } => {
                    let existed = tokio_test::block_on(cache.delete(&key)).unwrap();
                    prop_assert_eq!(existed, model.remove(&key).is_some());
                }
                CacheOp::DeleteIfEquals { key, expected } => {
                    let owned = model.get(&key) == Some(&expected);
                    let removed = tokio_test::block_on(cache.delete_if_equals(&key, &expected)).unwrap();
                    prop_assert_eq!(removed, owned);
                    if owned {
                        model.remove(&key);
                    }
                }
            }
        }
    }

    // A second set_if_absent on the same key never succeeds while the first value lives.
    #[test]
    fn prop_set_if_absent_single_winner(
        key in key_strategy(),
        first in value_strategy(),
        second in value_strategy(),
    ) {
        let mut store = CacheStore::new();

        prop_assert!(store.set_if_absent(&key, &first, LONG_TTL));
        prop_assert!(!store.set_if_absent(&key, &second, LONG_TTL));
        prop_assert_eq!(store.get(&key), Some(first));
    }

    // Plain entries decode to the shop that was encoded.
    #[test]
    fn prop_plain_codec_round_trip(shop in shop_strategy()) {
        let raw = codec::encode(&shop).unwrap();
        prop_assert_eq!(codec::decode(&raw).unwrap(), shop);
    }

    // Wrapped entries keep both the shop and the logical expiry.
    #[test]
    fn prop_wrapped_codec_round_trip(shop in shop_strategy(), expire_time in timestamp_strategy()) {
        let raw = codec::encode_wrapped_at(&shop, expire_time).unwrap();
        let entry = codec::decode_wrapped(&raw).unwrap();

        prop_assert_eq!(entry.expire_time, expire_time);
        prop_assert_eq!(entry.data, shop);
    }

    // Whitespace-only payloads are never mistaken for a shop.
    #[test]
    fn prop_blank_payload_never_decodes(blank in "[ \t\n]{0,8}") {
        prop_assert!(codec::decode(&blank).is_err());
        prop_assert!(codec::decode_wrapped(&blank).is_err());
    }
}
