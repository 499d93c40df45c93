//! Property-based generators for operator tests.

use proptest::prelude::*;
use types::Value;

/// Random scalar covering all four variants.
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        "[a-z]{1,20}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Join key drawn from a small domain so random relations actually collide.
/// Occasionally Null, which no equi-join may match.
pub fn arb_join_key() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => (0..8i64).prop_map(Value::Int),
        1 => Just(Value::Null),
    ]
}

/// Relation of `(key INT, payload INT)` rows with a small, nullable key
/// domain, suitable as either side of an equi-join.
pub fn arb_join_relation(max_rows: usize) -> impl Strategy<Value = Vec<Vec<Value>>> {
    prop::collection::vec(
        (arb_join_key(), -100..100i64).prop_map(|(key, payload)| vec![key, Value::Int(payload)]),
        0..=max_rows,
    )
}
