//! Column schemas for operator outputs.

use common::{DbError, DbResult};
use std::sync::Arc;
use types::SqlType;

/// One named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: SqlType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Immutable column layout of an operator's output tuples.
///
/// Schemas are shared between an operator and every tuple it produces, so
/// they are passed around as [`SchemaRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

pub type SchemaRef = Arc<Schema>;

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> DbResult<&Field> {
        self.fields
            .get(idx)
            .ok_or_else(|| DbError::Schema(format!("column {idx} out of range")))
    }

    /// Concatenated schema of a join output: left columns then right columns.
    pub fn join(left: &Schema, right: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(left.len() + right.len());
        fields.extend_from_slice(&left.fields);
        fields.extend_from_slice(&right.fields);
        Schema::new(fields)
    }

    /// Schema holding the given columns of `self`, in the given order.
    /// Columns may repeat.
    pub fn project(&self, cols: &[usize]) -> DbResult<Schema> {
        let mut fields = Vec::with_capacity(cols.len());
        for &idx in cols {
            fields.push(self.field(idx)?.clone());
        }
        Ok(Schema::new(fields))
    }
}
