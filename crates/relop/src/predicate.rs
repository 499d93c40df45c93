//! Comparison predicates evaluated against single tuples.

use crate::Tuple;
use common::{DbError, DbResult};
use std::cmp::Ordering;
use std::fmt;
use types::Value;

/// One side of a comparison: a column of the input tuple or a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Field(usize),
    Literal(Value),
}

impl Operand {
    fn resolve<'a>(&'a self, tuple: &'a Tuple) -> DbResult<&'a Value> {
        match self {
            Operand::Field(idx) => tuple.field(*idx),
            Operand::Literal(value) => Ok(value),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(idx) => write!(f, "#{idx}"),
            Operand::Literal(value) => write!(f, "{value:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Ne => ord != Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ge => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompOp::Eq => "=",
            CompOp::Ne => "!=",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// A single comparison between two operands.
///
/// Stateless: one predicate can be evaluated against any number of tuples
/// and survives operator restarts unchanged. A `Null` operand makes the
/// comparison false; comparing values of different non-null types is an
/// executor error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    left: Operand,
    op: CompOp,
    right: Operand,
}

impl Predicate {
    pub fn new(left: Operand, op: CompOp, right: Operand) -> Self {
        Self { left, op, right }
    }

    pub fn evaluate(&self, tuple: &Tuple) -> DbResult<bool> {
        let left = self.left.resolve(tuple)?;
        let right = self.right.resolve(tuple)?;

        if left.is_null() || right.is_null() {
            return Ok(false);
        }

        match left.cmp_same_type(right) {
            Some(ord) => Ok(self.op.matches(ord)),
            None => Err(DbError::Executor(format!(
                "cannot compare {left:?} with {right:?}"
            ))),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// Disjunction over a predicate set: true iff ANY predicate accepts the
/// tuple. An empty set accepts nothing.
pub fn qualify(predicates: &[Predicate], tuple: &Tuple) -> DbResult<bool> {
    for predicate in predicates {
        if predicate.evaluate(tuple)? {
            return Ok(true);
        }
    }
    Ok(false)
}
