//! Property tests for pair normalization and string coercion.
//!
//! These check the invariants every source adapter relies on: occurrence
//! count decides scalar vs list, value order is preserved, and normalizing an
//! already-normalized map is a no-op.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use formwise_core::coerce::int_as_string;
use formwise_core::params::{ParamValue, RawPair, normalize};
use formwise_core::rule::Rule;
use proptest::prelude::*;
use serde_json::{Value, json};

// Strategy: small key alphabet so repeats are common
fn arb_pairs() -> impl Strategy<Value = Vec<RawPair>> {
    prop::collection::vec(
        (
            prop::string::string_regex("[a-d]").unwrap(),
            prop::string::string_regex("[a-z0-9 ]{0,6}").unwrap(),
        ),
        0..24,
    )
}

proptest! {
    /// Property: a key seen once is a scalar, a key seen twice or more is a list
    #[test]
    fn proptest_occurrence_count_decides_shape(pairs in arb_pairs()) {
        let params = normalize(&pairs);

        for (key, value) in params.iter() {
            let count = pairs.iter().filter(|(k, _)| k == key).count();
            match value {
                ParamValue::Single(_) => prop_assert_eq!(count, 1),
                ParamValue::Multiple(values) => {
                    prop_assert!(count >= 2);
                    prop_assert_eq!(values.len(), count);
                }
            }
        }
    }

    /// Property: values under a key keep their encounter order
    #[test]
    fn proptest_order_is_preserved(pairs in arb_pairs()) {
        let params = normalize(&pairs);

        for (key, value) in params.iter() {
            let expected: Vec<&String> = pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v)
                .collect();
            let actual: Vec<&String> = value.values().iter().collect();
            prop_assert_eq!(actual, expected);
        }
    }

    /// Property: every input key appears, and nothing else does
    #[test]
    fn proptest_keys_are_exactly_the_input_keys(pairs in arb_pairs()) {
        let params = normalize(&pairs);
        let mut distinct: Vec<&String> = pairs.iter().map(|(k, _)| k).collect();
        distinct.sort();
        distinct.dedup();

        prop_assert_eq!(params.len(), distinct.len());
        for key in distinct {
            prop_assert!(params.get(key).is_some());
        }
    }

    /// Property: normalizing an already-normalized map reproduces it
    #[test]
    fn proptest_normalization_is_idempotent(pairs in arb_pairs()) {
        let params = normalize(&pairs);
        prop_assert_eq!(normalize(&params.to_pairs()), params);
    }

    /// Property: any i32 round-trips through its decimal spelling
    #[test]
    fn proptest_int_as_string_accepts_decimal_spelling(n in any::<i32>()) {
        let out = int_as_string().parse(Some(&json!(n.to_string()))).unwrap();
        prop_assert_eq!(out, json!(n));
    }

    /// Property: strings with a non-digit character are rejected
    #[test]
    fn proptest_int_as_string_rejects_non_digits(
        prefix in "[0-9]{0,3}",
        bad in "[a-zA-Z.+ ]",
        suffix in "[0-9]{0,3}",
    ) {
        let input = Value::String(format!("{prefix}{bad}{suffix}"));
        prop_assert!(int_as_string().parse(Some(&input)).is_err());
    }
}
