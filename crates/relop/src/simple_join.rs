//! Nested-loops join over arbitrary OR-ed predicates.

use crate::{indent, qualify, Lookahead, Operator, Predicate, Schema, SchemaRef, Tuple};
use common::{DbError, DbResult};
use std::sync::Arc;

/// Left-major, right-minor nested loops: for each left tuple the right
/// child is restarted and fully re-scanned, and every concatenated pair
/// that satisfies the predicate set is emitted. Nothing is materialized,
/// so the right child pays a full restart per left tuple.
pub struct SimpleJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    predicates: Vec<Predicate>,
    schema: SchemaRef,
    current_left: Option<Tuple>,
    lookahead: Lookahead,
}

impl SimpleJoin {
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        predicates: Vec<Predicate>,
    ) -> Self {
        let schema = Arc::new(Schema::join(left.schema(), right.schema()));
        Self {
            left,
            right,
            predicates,
            schema,
            current_left: None,
            lookahead: Lookahead::default(),
        }
    }

    fn find_next(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.get_next()?);
                self.right.restart()?;
            }

            while self.right.has_next()? {
                let right = self.right.get_next()?;
                let left = self
                    .current_left
                    .as_ref()
                    .ok_or_else(|| DbError::Executor("join lost its outer tuple".into()))?;
                let joined = Tuple::join(left, &right, &self.schema)?;
                if qualify(&self.predicates, &joined)? {
                    return Ok(Some(joined));
                }
            }

            self.current_left = None;
        }
    }
}

impl Operator for SimpleJoin {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        self.left.restart()?;
        self.right.restart()?;
        self.current_left = None;
        self.lookahead.reset();
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        self.lookahead.reset();
    }

    fn is_open(&self) -> bool {
        self.left.is_open() && self.right.is_open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.lookahead.is_computed() {
            let next = self.find_next()?;
            self.lookahead.set(next);
        }
        Ok(self.lookahead.is_ready())
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::Executor("join has no next tuple".into()));
        }
        self.lookahead
            .take()
            .ok_or_else(|| DbError::Executor("join lookahead lost its tuple".into()))
    }

    fn explain(&self, depth: usize) -> String {
        let preds: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        format!(
            "{}SimpleJoin: {}\n{}\n{}",
            indent(depth),
            if preds.is_empty() {
                "<none>".to_string()
            } else {
                preds.join(" OR ")
            },
            self.left.explain(depth + 1),
            self.right.explain(depth + 1)
        )
    }
}
