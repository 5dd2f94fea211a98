//! Property-based tests for the determinism guarantees of the two digests.

use proptest::prelude::*;
use strata::canon;
use strata::config::Config;
use strata::value::Value;
use std::collections::HashMap;

/// Build a config whose top level and one nested level hold `entries` in the
/// given key order.
fn build(order: &[&String], entries: &HashMap<String, i64>) -> Config {
    let mut nested = Config::new();
    for key in order {
        nested.set((*key).clone(), Value::Int(entries[*key])).unwrap();
    }
    let mut cfg = Config::new();
    for key in order {
        cfg.set((*key).clone(), Value::Int(entries[*key])).unwrap();
    }
    cfg.set("nested", Value::Map(nested)).unwrap();
    cfg
}

/// Test that both digests ignore key insertion order at every level
#[test]
fn test_digests_ignore_insertion_order_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::hash_map("k_[a-z]{1,6}", any::<i64>(), 1..8),
            |entries| {
                let mut forward: Vec<&String> = entries.keys().collect();
                forward.sort();
                let mut reversed = forward.clone();
                reversed.reverse();

                let a = build(&forward, &entries);
                let b = build(&reversed, &entries);

                assert_eq!(canon::shape_digest(&a), canon::shape_digest(&b));
                assert_eq!(canon::content_digest(&a), canon::content_digest(&b));
                Ok(())
            },
        )
        .unwrap();
}

/// Test that leaf value changes move the content digest but not the shape
#[test]
fn test_value_changes_move_content_digest_only() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::hash_map("k_[a-z]{1,6}", any::<i64>(), 1..8),
            |entries| {
                let mut order: Vec<&String> = entries.keys().collect();
                order.sort();

                let original = build(&order, &entries);

                let mut changed_entries = entries.clone();
                let first = order[0].clone();
                *changed_entries.get_mut(&first).unwrap() =
                    entries[&first].wrapping_add(1);
                let changed = build(&order, &changed_entries);

                assert_eq!(
                    canon::shape_digest(&original),
                    canon::shape_digest(&changed)
                );
                assert_ne!(
                    canon::content_digest(&original),
                    canon::content_digest(&changed)
                );
                Ok(())
            },
        )
        .unwrap();
}

/// Test that renaming a key moves both digests
#[test]
fn test_key_renames_move_both_digests() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::hash_map("k_[a-z]{1,6}", any::<i64>(), 1..8),
            |entries| {
                let mut order: Vec<&String> = entries.keys().collect();
                order.sort();

                let renamed_key = format!("{}x", order[0]);
                prop_assume!(!entries.contains_key(&renamed_key));

                let original = build(&order, &entries);

                let mut renamed_entries = HashMap::new();
                for (key, value) in &entries {
                    let key = if key == order[0] {
                        renamed_key.clone()
                    } else {
                        key.clone()
                    };
                    renamed_entries.insert(key, *value);
                }
                let mut renamed_order: Vec<&String> = renamed_entries.keys().collect();
                renamed_order.sort();
                let renamed = build(&renamed_order, &renamed_entries);

                assert_ne!(
                    canon::shape_digest(&original),
                    canon::shape_digest(&renamed)
                );
                assert_ne!(
                    canon::content_digest(&original),
                    canon::content_digest(&renamed)
                );
                Ok(())
            },
        )
        .unwrap();
}

/// Test that the canonical text round-trips through the YAML collaborator
/// with an unchanged content digest
#[test]
fn test_text_round_trip_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::hash_map("k_[a-z]{1,6}", "[a-z ]{0,10}", 1..8),
            |entries| {
                let mut order: Vec<&String> = entries.keys().collect();
                order.sort();

                let mut cfg = Config::new();
                for key in &order {
                    cfg.set((*key).clone(), Value::Str(entries[*key].clone()))
                        .unwrap();
                }
                cfg.finalize();

                let reloaded = Config::from_yaml_str(&cfg.to_string()).unwrap();
                assert_eq!(
                    canon::content_digest(&reloaded),
                    canon::content_digest(&cfg)
                );
                Ok(())
            },
        )
        .unwrap();
}

/// Test that digest computation itself is deterministic
#[test]
fn test_digest_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::hash_map("k_[a-z]{1,6}", any::<i64>(), 1..8),
            |entries| {
                let mut order: Vec<&String> = entries.keys().collect();
                order.sort();
                let cfg = build(&order, &entries);

                assert_eq!(canon::shape_digest(&cfg), canon::shape_digest(&cfg));
                assert_eq!(canon::content_digest(&cfg), canon::content_digest(&cfg));
                Ok(())
            },
        )
        .unwrap();
}
