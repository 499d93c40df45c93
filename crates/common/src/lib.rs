
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;
use thiserror::Error;
use types::Value;

/// Logical identifier for a page in a heap or index file.
/// Examples:
/// - `let header_page = PageId(0);`
/// - `let data_page = PageId(42);`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// Fully-qualified address of a record within a heap file.
/// Examples:
/// - `let rid = RecordId { page_id: PageId(42), slot: 3 };`
/// - `let rid = RecordId { page_id: PageId(0), slot: 0 };`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

/// Hashable, comparable wrapper around a single field value.
///
/// SearchKey is the key type for both the persistent hash index and the
/// in-memory duplicate table used by the hash join. Hashing is type-tagged
/// so that `Int(1)` and `Text("1")` never collide by construction, and the
/// same digest is used everywhere a bucket id is computed — this is the
/// shared hash parameter the join's bucket-alignment step relies on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchKey(Value);

impl SearchKey {
    pub fn new(value: Value) -> Self {
        SearchKey(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Type-tagged digest of the wrapped value.
    pub fn hash_u64(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match &self.0 {
            Value::Int(i) => {
                0u8.hash(&mut hasher);
                i.hash(&mut hasher);
            }
            Value::Text(s) => {
                1u8.hash(&mut hasher);
                s.hash(&mut hasher);
            }
            Value::Bool(b) => {
                2u8.hash(&mut hasher);
                b.hash(&mut hasher);
            }
            Value::Null => {
                3u8.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// Bucket id of this key under the given modulus.
    pub fn bucket(&self, num_buckets: u32) -> u32 {
        (self.hash_u64() % u64::from(num_buckets)) as u32
    }
}

impl Hash for SearchKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_u64());
    }
}

impl From<Value> for SearchKey {
    fn from(value: Value) -> Self {
        SearchKey(value)
    }
}

/// Canonical error type shared across the workspace.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("exec: {0}")]
    Executor(String),
    #[error("schema: {0}")]
    Schema(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("index: {0}")]
    Index(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{DbError, DbResult, PageId, RecordId, SearchKey};
    pub use types::{SqlType, Value};
}
