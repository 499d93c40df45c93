//! Assertion helpers for operator output.

use relop::Operator;
use types::Value;

/// Pull an operator dry and return the raw row values.
pub fn drain(op: &mut dyn Operator) -> Vec<Vec<Value>> {
    let mut out = Vec::new();
    while op.has_next().expect("has_next while draining") {
        out.push(op.get_next().expect("get_next while draining").values().to_vec());
    }
    out
}

/// Canonical order for comparing row multisets.
pub fn sorted_rows(mut rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    rows.sort_by_key(|row| format!("{row:?}"));
    rows
}

/// Assert two operators' outputs are the same multiset of rows.
pub fn assert_multiset_eq(left: Vec<Vec<Value>>, right: Vec<Vec<Value>>) {
    assert_eq!(sorted_rows(left), sorted_rows(right));
}
