//! One-slot lookahead cursor shared by the tuple-producing operators.

use crate::Tuple;

/// Explicit state of an operator's one-tuple lookahead.
///
/// `has_next` computes the next tuple at most once and parks it here;
/// `get_next` hands it out and returns the cursor to `NotComputed`. Once
/// `Exhausted`, the cursor stays exhausted until a restart resets it.
#[derive(Debug, Default)]
pub enum Lookahead {
    #[default]
    NotComputed,
    Ready(Tuple),
    Exhausted,
}

impl Lookahead {
    pub fn is_computed(&self) -> bool {
        !matches!(self, Lookahead::NotComputed)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Lookahead::Ready(_))
    }

    /// Record the result of computing the next tuple.
    pub fn set(&mut self, next: Option<Tuple>) {
        *self = match next {
            Some(tuple) => Lookahead::Ready(tuple),
            None => Lookahead::Exhausted,
        };
    }

    /// Hand out the parked tuple, returning the cursor to `NotComputed`.
    /// `None` if nothing is parked.
    pub fn take(&mut self) -> Option<Tuple> {
        match self {
            Lookahead::Ready(_) => {
                let Lookahead::Ready(tuple) = std::mem::take(self) else {
                    unreachable!("matched Ready above");
                };
                Some(tuple)
            }
            _ => None,
        }
    }

    /// Forget any parked state. Used by restart.
    pub fn reset(&mut self) {
        *self = Lookahead::NotComputed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Schema};
    use std::sync::Arc;
    use types::{SqlType, Value};

    fn tuple() -> Tuple {
        let schema = Arc::new(Schema::new(vec![Field::new("n", SqlType::Int)]));
        Tuple::new(schema, vec![Value::Int(7)]).unwrap()
    }

    #[test]
    fn starts_not_computed() {
        let mut cursor = Lookahead::default();
        assert!(!cursor.is_computed());
        assert!(!cursor.is_ready());
        assert!(cursor.take().is_none());
    }

    #[test]
    fn ready_hands_out_once() {
        let mut cursor = Lookahead::default();
        cursor.set(Some(tuple()));
        assert!(cursor.is_ready());

        let t = cursor.take().unwrap();
        assert_eq!(t.field(0).unwrap(), &Value::Int(7));
        assert!(!cursor.is_computed());
        assert!(cursor.take().is_none());
    }

    #[test]
    fn exhausted_is_sticky_until_reset() {
        let mut cursor = Lookahead::default();
        cursor.set(None);
        assert!(cursor.is_computed());
        assert!(!cursor.is_ready());
        assert!(cursor.take().is_none());

        cursor.reset();
        assert!(!cursor.is_computed());
    }
}
