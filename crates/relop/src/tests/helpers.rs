//! Shared helpers for the operator unit tests.

use crate::{indent, BucketAccess, Field, Operator, Schema, SchemaRef, Tuple};
use common::{DbError, DbResult};
use std::sync::Arc;
use types::{SqlType, Value};

/// Schema of `n` integer columns named `c0..`.
pub fn int_schema(n: usize) -> SchemaRef {
    let fields = (0..n)
        .map(|i| Field::new(format!("c{i}"), SqlType::Int))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Schema used by the scan tests: (id INT, name TEXT).
pub fn people_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", SqlType::Int),
        Field::new("name", SqlType::Text),
    ]))
}

/// Integer rows from literals.
pub fn int_rows(rows: &[&[i64]]) -> Vec<Vec<Value>> {
    rows.iter()
        .map(|row| row.iter().copied().map(Value::Int).collect())
        .collect()
}

/// Pull an operator dry and return the raw row values.
pub fn drain_values(op: &mut dyn Operator) -> Vec<Vec<Value>> {
    let mut out = Vec::new();
    while op.has_next().unwrap() {
        out.push(op.get_next().unwrap().values().to_vec());
    }
    out
}

/// Canonical order for multiset comparison of rows.
pub fn sorted_rows(mut rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    rows.sort_by_key(|row| format!("{row:?}"));
    rows
}

/// Operator over a fixed in-memory list of rows.
///
/// Its bucket access is `Derived`, so a hash join built on top of it
/// exercises the spool-to-scratch partitioning path.
pub struct MockOperator {
    schema: SchemaRef,
    tuples: Vec<Tuple>,
    pos: usize,
    open: bool,
}

impl MockOperator {
    pub fn new(schema: SchemaRef, rows: Vec<Vec<Value>>) -> Self {
        let tuples = rows
            .into_iter()
            .map(|values| Tuple::new(schema.clone(), values).unwrap())
            .collect();
        Self {
            schema,
            tuples,
            pos: 0,
            open: true,
        }
    }
}

impl Operator for MockOperator {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        self.pos = 0;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.open {
            return Err(DbError::Executor("mock operator is closed".into()));
        }
        Ok(self.pos < self.tuples.len())
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::Executor("mock operator has no next tuple".into()));
        }
        let tuple = self.tuples[self.pos].clone();
        self.pos += 1;
        Ok(tuple)
    }

    fn explain(&self, depth: usize) -> String {
        format!("{}Mock: {} rows", indent(depth), self.tuples.len())
    }

    fn bucket_access(&self) -> BucketAccess {
        BucketAccess::Derived
    }
}
