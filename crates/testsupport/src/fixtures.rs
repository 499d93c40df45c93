//! Fixtures for operator and storage tests.

use common::{DbError, DbResult};
use relop::{build_index, BucketAccess, Field, Operator, Schema, SchemaRef, Tuple};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::HeapFile;
use types::{SqlType, Value};

/// Schema of `n` integer columns named `c0..`.
pub fn int_schema(n: usize) -> SchemaRef {
    let fields = (0..n)
        .map(|i| Field::new(format!("c{i}"), SqlType::Int))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Two-column schema used by most join fixtures: (key INT, tag TEXT).
pub fn keyed_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("key", SqlType::Int),
        Field::new("tag", SqlType::Text),
    ]))
}

pub fn keyed_row(key: i64, tag: &str) -> Vec<Value> {
    vec![Value::Int(key), Value::Text(tag.into())]
}

/// Create a heap file under `dir` holding the given rows, in order.
pub fn heap_with_rows(dir: &Path, name: &str, rows: &[Vec<Value>]) -> DbResult<PathBuf> {
    let path = dir.join(name);
    let mut heap = HeapFile::open(&path)?;
    for row in rows {
        heap.insert(row)?;
    }
    Ok(path)
}

/// Create a heap file plus a hash index on one of its columns.
/// Returns `(heap_path, index_path)`.
pub fn indexed_heap_with_rows(
    dir: &Path,
    name: &str,
    rows: &[Vec<Value>],
    col: usize,
) -> DbResult<(PathBuf, PathBuf)> {
    let heap_path = heap_with_rows(dir, name, rows)?;
    let index_path = dir.join(format!("{name}.idx"));
    build_index(&heap_path, &index_path, col)?;
    Ok((heap_path, index_path))
}

/// Operator over a fixed in-memory list of rows.
///
/// Restartable, closable, and `Derived` for bucket access, so joins built
/// on top of it exercise their spooling path.
pub struct RowsOperator {
    schema: SchemaRef,
    tuples: Vec<Tuple>,
    pos: usize,
    open: bool,
}

impl RowsOperator {
    /// Panics on rows that do not fit the schema; fixture data is expected
    /// to be well-formed.
    pub fn new(schema: SchemaRef, rows: Vec<Vec<Value>>) -> Self {
        let tuples = rows
            .into_iter()
            .map(|values| Tuple::new(schema.clone(), values).expect("fixture row fits schema"))
            .collect();
        Self {
            schema,
            tuples,
            pos: 0,
            open: true,
        }
    }
}

impl Operator for RowsOperator {
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
            return Err(DbError::Executor("rows operator is closed".into()));
        }
        Ok(self.pos < self.tuples.len())
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::Executor("rows operator has no next tuple".into()));
        }
        let tuple = self.tuples[self.pos].clone();
        self.pos += 1;
        Ok(tuple)
    }

    fn explain(&self, depth: usize) -> String {
        format!("{}Rows: {} rows", "  ".repeat(depth), self.tuples.len())
    }

    fn bucket_access(&self) -> BucketAccess {
        BucketAccess::Derived
    }
}
