//! Selection: filter a child's output through an OR-ed predicate set.

use crate::{indent, qualify, Lookahead, Operator, Predicate, SchemaRef, Tuple};
use common::{DbError, DbResult};

/// Emits exactly the child tuples that satisfy at least one predicate.
/// Schema and tuple identity are inherited from the child unchanged; an
/// empty predicate set emits nothing.
pub struct Selection {
    child: Box<dyn Operator>,
    predicates: Vec<Predicate>,
    lookahead: Lookahead,
}

impl Selection {
    pub fn new(child: Box<dyn Operator>, predicates: Vec<Predicate>) -> Self {
        Self {
            child,
            predicates,
            lookahead: Lookahead::default(),
        }
    }

    fn find_next(&mut self) -> DbResult<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.get_next()?;
            if qualify(&self.predicates, &tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

impl Operator for Selection {
    fn schema(&self) -> &SchemaRef {
        self.child.schema()
    }

    fn restart(&mut self) -> DbResult<()> {
        self.child.restart()?;
        self.lookahead.reset();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.lookahead.reset();
    }

    fn is_open(&self) -> bool {
        self.child.is_open()
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
            return Err(DbError::Executor("selection has no next tuple".into()));
        }
        self.lookahead
            .take()
            .ok_or_else(|| DbError::Executor("selection lookahead lost its tuple".into()))
    }

    fn explain(&self, depth: usize) -> String {
        let preds: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        format!(
            "{}Selection: {}\n{}",
            indent(depth),
            if preds.is_empty() {
                "<none>".to_string()
            } else {
                preds.join(" OR ")
            },
            self.child.explain(depth + 1)
        )
    }
}
