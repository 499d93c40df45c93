//! Schema-typed rows flowing between operators.

use crate::{Schema, SchemaRef};
use common::{DbError, DbResult};
use types::Value;

/// One row of values together with the schema that types it.
///
/// A tuple is always consistent with its schema: construction and every
/// field write validate arity and per-column type (`Null` fits any column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    schema: SchemaRef,
    values: Vec<Value>,
}

impl Tuple {
    pub fn new(schema: SchemaRef, values: Vec<Value>) -> DbResult<Self> {
        if values.len() != schema.len() {
            return Err(DbError::Schema(format!(
                "expected {} values, got {}",
                schema.len(),
                values.len()
            )));
        }
        for (idx, value) in values.iter().enumerate() {
            let field = schema.field(idx)?;
            if !value.is_type(field.ty) {
                return Err(DbError::Schema(format!(
                    "value {value:?} does not fit column {} ({:?})",
                    field.name, field.ty
                )));
            }
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn field(&self, idx: usize) -> DbResult<&Value> {
        self.schema.field(idx)?;
        Ok(&self.values[idx])
    }

    pub fn set_field(&mut self, idx: usize, value: Value) -> DbResult<()> {
        let field = self.schema.field(idx)?;
        if !value.is_type(field.ty) {
            return Err(DbError::Schema(format!(
                "value {value:?} does not fit column {} ({:?})",
                field.name, field.ty
            )));
        }
        self.values[idx] = value;
        Ok(())
    }

    /// Concatenate two tuples into one of the combined schema.
    pub fn join(left: &Tuple, right: &Tuple, combined: &SchemaRef) -> DbResult<Tuple> {
        let mut values = Vec::with_capacity(left.values.len() + right.values.len());
        values.extend_from_slice(&left.values);
        values.extend_from_slice(&right.values);
        Tuple::new(combined.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use types::SqlType;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", SqlType::Int),
            Field::new("name", SqlType::Text),
        ]))
    }

    #[test]
    fn new_validates_arity() {
        let err = Tuple::new(schema(), vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));
    }

    #[test]
    fn new_validates_field_types() {
        let err = Tuple::new(schema(), vec![Value::Text("1".into()), Value::Text("a".into())])
            .unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));
    }

    #[test]
    fn null_fits_any_column() {
        let tuple = Tuple::new(schema(), vec![Value::Null, Value::Null]).unwrap();
        assert_eq!(tuple.field(0).unwrap(), &Value::Null);
    }

    #[test]
    fn set_field_revalidates() {
        let mut tuple = Tuple::new(schema(), vec![Value::Int(1), Value::Text("a".into())]).unwrap();

        tuple.set_field(0, Value::Int(2)).unwrap();
        assert_eq!(tuple.field(0).unwrap(), &Value::Int(2));

        let err = tuple.set_field(0, Value::Bool(true)).unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));
    }

    #[test]
    fn join_concatenates_and_validates() {
        let left = Tuple::new(schema(), vec![Value::Int(1), Value::Text("a".into())]).unwrap();
        let right_schema = Arc::new(Schema::new(vec![Field::new("active", SqlType::Bool)]));
        let right = Tuple::new(right_schema.clone(), vec![Value::Bool(true)]).unwrap();

        let combined = Arc::new(Schema::join(left.schema(), &right_schema));
        let joined = Tuple::join(&left, &right, &combined).unwrap();
        assert_eq!(
            joined.values(),
            &[Value::Int(1), Value::Text("a".into()), Value::Bool(true)]
        );

        // A combined schema that does not match the concatenation is rejected.
        let wrong = Arc::new(Schema::new(vec![Field::new("x", SqlType::Int)]));
        assert!(Tuple::join(&left, &right, &wrong).is_err());
    }
}
