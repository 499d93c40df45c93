//! Projection: reorder and subset a child's columns. No deduplication.

use crate::{indent, Operator, Schema, SchemaRef, Tuple};
use common::{DbError, DbResult};
use std::sync::Arc;

/// Copies the selected columns of every child tuple into a fresh tuple of
/// the projected schema. One output per input; duplicates are kept.
pub struct Projection {
    child: Box<dyn Operator>,
    cols: Vec<usize>,
    schema: SchemaRef,
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("cols", &self.cols)
            .finish_non_exhaustive()
    }
}

impl Projection {
    /// Fails if any column index is out of range for the child's schema.
    pub fn new(child: Box<dyn Operator>, cols: Vec<usize>) -> DbResult<Self> {
        let schema = Arc::new(child.schema().project(&cols)?);
        Ok(Self {
            child,
            cols,
            schema,
        })
    }
}

impl Operator for Projection {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        self.child.restart()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn is_open(&self) -> bool {
        self.child.is_open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.child.has_next()
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        let tuple = self.child.get_next()?;
        let mut values = Vec::with_capacity(self.cols.len());
        for &col in &self.cols {
            values.push(tuple.field(col)?.clone());
        }
        Tuple::new(self.schema.clone(), values)
    }

    fn explain(&self, depth: usize) -> String {
        format!(
            "{}Projection: cols {:?}\n{}",
            indent(depth),
            self.cols,
            self.child.explain(depth + 1)
        )
    }
}
