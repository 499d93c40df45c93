//! Relational operators: a pull-based iterator tree over heap files and
//! hash indexes.
//!
//! Every operator implements [`Operator`]: leaves ([`FileScan`], [`KeyScan`],
//! [`IndexScan`]) read from storage, internal nodes ([`Selection`],
//! [`Projection`], [`SimpleJoin`], [`HashJoin`]) pull from children. An
//! operator is open from construction until `close`; `restart` rewinds it to
//! its first tuple. `has_next` is non-consuming and idempotent; `get_next`
//! with no tuple available is a protocol error.
//!
//! ```text
//! Projection
//!     ↓ get_next()
//! Selection
//!     ↓ get_next()
//! FileScan ── heap file
//! ```
//!
//! The partitioned [`HashJoin`] additionally needs scratch files, which are
//! handed out by an injected [`ScratchSpace`] allocator and reclaimed when
//! the join closes or restarts.

mod hash_join;
mod lookahead;
mod predicate;
mod projection;
mod scan;
mod schema;
mod scratch;
mod selection;
mod simple_join;
mod tuple;

pub use hash_join::HashJoin;
pub use lookahead::Lookahead;
pub use predicate::{qualify, CompOp, Operand, Predicate};
pub use projection::Projection;
pub use scan::{build_index, FileScan, IndexScan, KeyScan};
pub use schema::{Field, Schema, SchemaRef};
pub use scratch::{ScratchFile, ScratchSpace};
pub use selection::Selection;
pub use simple_join::SimpleJoin;
pub use tuple::Tuple;

use common::{DbResult, RecordId};
use std::path::PathBuf;

/// Pull-based iterator interface shared by every relational operator.
///
/// Operators are open on construction. `restart` releases and reacquires
/// whatever the operator holds and leaves it open at its first tuple;
/// `close` releases resources for good. Calling `has_next`/`get_next` on a
/// closed operator is an executor error.
pub trait Operator {
    /// Schema of the tuples this operator produces.
    fn schema(&self) -> &SchemaRef;

    /// Rewind to the first output tuple. The operator ends up open.
    fn restart(&mut self) -> DbResult<()>;

    /// Release all held resources. Safe to call more than once.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Whether another tuple is available. Non-consuming and idempotent.
    fn has_next(&mut self) -> DbResult<bool>;

    /// The next tuple. Erroring when none is available (protocol misuse),
    /// never blocking or retrying.
    fn get_next(&mut self) -> DbResult<Tuple>;

    /// Indented, multi-line description of this operator subtree.
    fn explain(&self, depth: usize) -> String;

    /// How a hash join may partition this operator's output.
    fn bucket_access(&self) -> BucketAccess {
        BucketAccess::Derived
    }

    /// Address of the most recently returned tuple, for operators whose
    /// tuples live at stable heap addresses.
    fn last_rid(&self) -> Option<RecordId> {
        None
    }
}

/// How a hash join can obtain bucket-partitioned access to an operator's
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketAccess {
    /// The operator reads through a hash index already keyed on its rows;
    /// the join reuses that index directly.
    Bucketed { index: PathBuf, heap: PathBuf },
    /// Tuples live at stable addresses in an existing heap file; the join
    /// only needs to build a scratch index over those addresses.
    Addressed { heap: PathBuf },
    /// Tuples are computed on the fly; the join spools them into a scratch
    /// heap and indexes the copies.
    Derived,
}

pub(crate) fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
pub(crate) mod tests {
    pub mod helpers;
}
