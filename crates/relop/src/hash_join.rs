//! Partitioned equi-join over bucket-aligned hash index scans.

use crate::{
    indent, BucketAccess, IndexScan, Lookahead, Operator, Schema, SchemaRef, ScratchFile,
    ScratchSpace, Tuple,
};
use common::{DbError, DbResult, SearchKey};
use hash::HashIndex;
use std::collections::HashMap;
use std::sync::Arc;
use storage::HeapFile;

/// In-memory multimap from join key to the right-side tuples of one bucket.
#[derive(Default)]
struct HashTableDup {
    entries: HashMap<SearchKey, Vec<Tuple>>,
}

impl HashTableDup {
    fn insert(&mut self, key: SearchKey, tuple: Tuple) {
        self.entries.entry(key).or_default().push(tuple);
    }

    fn get(&self, key: &SearchKey) -> &[Tuple] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One join input partitioned into a bucket-ordered index scan. The scratch
/// tokens keep any spill files alive exactly as long as the partition.
struct Partition {
    scan: IndexScan,
    _index: Option<ScratchFile>,
    _heap: Option<ScratchFile>,
}

impl Partition {
    /// Turn a child into a bucket-ordered scan, reusing whatever bucket
    /// access the child already offers.
    fn build(child: &mut dyn Operator, col: usize, scratch: &ScratchSpace) -> DbResult<Partition> {
        match child.bucket_access() {
            BucketAccess::Bucketed { index, heap } => Ok(Partition {
                scan: IndexScan::open(child.schema().clone(), index, heap)?,
                _index: None,
                _heap: None,
            }),
            BucketAccess::Addressed { heap } => {
                // Rows already live at stable addresses; index them in place.
                let index_file = scratch.alloc("join-idx")?;
                let mut index = HashIndex::create(index_file.path())?;
                while child.has_next()? {
                    let tuple = child.get_next()?;
                    let rid = child.last_rid().ok_or_else(|| {
                        DbError::Executor("addressed input reported no record address".into())
                    })?;
                    index.insert(&SearchKey::new(tuple.field(col)?.clone()), rid)?;
                }
                index.flush()?;
                Ok(Partition {
                    scan: IndexScan::open(child.schema().clone(), index_file.path(), heap)?,
                    _index: Some(index_file),
                    _heap: None,
                })
            }
            BucketAccess::Derived => {
                // Spool the child's output to obtain addresses, indexing
                // each row as it lands.
                let heap_file = scratch.alloc("join-heap")?;
                let index_file = scratch.alloc("join-idx")?;
                let mut heap = HeapFile::open(heap_file.path())?;
                let mut index = HashIndex::create(index_file.path())?;
                while child.has_next()? {
                    let tuple = child.get_next()?;
                    let rid = heap.insert(tuple.values())?;
                    index.insert(&SearchKey::new(tuple.field(col)?.clone()), rid)?;
                }
                index.flush()?;
                Ok(Partition {
                    scan: IndexScan::open(
                        child.schema().clone(),
                        index_file.path(),
                        heap_file.path(),
                    )?,
                    _index: Some(index_file),
                    _heap: Some(heap_file),
                })
            }
        }
    }
}

/// Drain the right partition up to and including the given bucket,
/// collecting that bucket's tuples keyed by their exact join value.
/// Entries of later buckets are left unconsumed for the next build.
fn build_table(right: &mut Partition, bucket: u32, rcol: usize) -> DbResult<HashTableDup> {
    let mut table = HashTableDup::default();
    while let Some(rbucket) = right.scan.get_next_hash()? {
        if rbucket > bucket {
            break;
        }
        let Some(tuple) = right.scan.next_tuple()? else {
            break;
        };
        if rbucket < bucket {
            continue;
        }
        // A Null join key matches nothing, same as `Null = x` predicates.
        let value = tuple.field(rcol)?;
        if value.is_null() {
            continue;
        }
        let key = SearchKey::new(value.clone());
        table.insert(key, tuple);
    }
    Ok(table)
}

/// Partitioned hash equi-join on one column per side.
///
/// Both inputs are partitioned into bucket-ordered index scans sharing one
/// hash modulus. Matching then walks the left partition bucket by bucket,
/// loading each right bucket once into an in-memory [`HashTableDup`] and
/// probing it with the left tuple's exact key, so same-bucket values with
/// different keys never join. Duplicate keys yield the full same-key cross
/// product. Null join keys on either side match nothing, mirroring how
/// predicate comparisons treat Null.
///
/// Output order is deterministic within one pass (left bucket major, left
/// tuple, right insertion order); a restart re-partitions and may reorder.
pub struct HashJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    lcol: usize,
    rcol: usize,
    schema: SchemaRef,
    scratch: Arc<ScratchSpace>,
    partitions: Option<(Partition, Partition)>,
    table: HashTableDup,
    current_bucket: Option<u32>,
    current_left: Option<Tuple>,
    matches: Vec<Tuple>,
    match_idx: usize,
    lookahead: Lookahead,
    open: bool,
}

impl std::fmt::Debug for HashJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashJoin")
            .field("lcol", &self.lcol)
            .field("rcol", &self.rcol)
            .finish_non_exhaustive()
    }
}

impl HashJoin {
    /// Fails on an unsupported configuration: a join column out of range,
    /// join column types that cannot be equal, or partitions whose indexes
    /// disagree on the hash modulus.
    pub fn new(
        mut left: Box<dyn Operator>,
        mut right: Box<dyn Operator>,
        lcol: usize,
        rcol: usize,
        scratch: Arc<ScratchSpace>,
    ) -> DbResult<Self> {
        let lfield = left.schema().fields().get(lcol).cloned().ok_or_else(|| {
            DbError::Executor(format!("left join column {lcol} out of range"))
        })?;
        let rfield = right.schema().fields().get(rcol).cloned().ok_or_else(|| {
            DbError::Executor(format!("right join column {rcol} out of range"))
        })?;
        if lfield.ty != rfield.ty {
            return Err(DbError::Executor(format!(
                "join column types differ: {:?} vs {:?}",
                lfield.ty, rfield.ty
            )));
        }

        let schema = Arc::new(Schema::join(left.schema(), right.schema()));
        let partitions =
            Self::build_partitions(left.as_mut(), right.as_mut(), lcol, rcol, &scratch)?;

        Ok(Self {
            left,
            right,
            lcol,
            rcol,
            schema,
            scratch,
            partitions: Some(partitions),
            table: HashTableDup::default(),
            current_bucket: None,
            current_left: None,
            matches: Vec::new(),
            match_idx: 0,
            lookahead: Lookahead::default(),
            open: true,
        })
    }

    fn build_partitions(
        left: &mut dyn Operator,
        right: &mut dyn Operator,
        lcol: usize,
        rcol: usize,
        scratch: &ScratchSpace,
    ) -> DbResult<(Partition, Partition)> {
        let left_part = Partition::build(left, lcol, scratch)?;
        let right_part = Partition::build(right, rcol, scratch)?;
        if left_part.scan.bucket_count()? != right_part.scan.bucket_count()? {
            return Err(DbError::Executor(
                "join inputs use different hash bucket counts".into(),
            ));
        }
        Ok((left_part, right_part))
    }

    fn find_next(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            // Unconsumed matches for the current probe tuple first.
            if self.match_idx < self.matches.len() {
                let left = self.current_left.as_ref().ok_or_else(|| {
                    DbError::Executor("match cache without a probe tuple".into())
                })?;
                let right = &self.matches[self.match_idx];
                let joined = Tuple::join(left, right, &self.schema)?;
                self.match_idx += 1;
                return Ok(Some(joined));
            }

            let (left_part, right_part) = self
                .partitions
                .as_mut()
                .ok_or_else(|| DbError::Executor("hash join is closed".into()))?;

            let Some(bucket) = left_part.scan.get_next_hash()? else {
                return Ok(None);
            };
            let Some(left_tuple) = left_part.scan.next_tuple()? else {
                return Ok(None);
            };

            if self.current_bucket != Some(bucket) {
                self.table = build_table(right_part, bucket, self.rcol)?;
                self.current_bucket = Some(bucket);
            }

            // Exact-key probe; sharing a bucket is not enough to match,
            // and a Null key matches nothing.
            let value = left_tuple.field(self.lcol)?;
            if value.is_null() {
                continue;
            }
            let key = SearchKey::new(value.clone());
            self.matches = self.table.get(&key).to_vec();
            self.match_idx = 0;
            self.current_left = Some(left_tuple);
        }
    }

    fn reset_matching_state(&mut self) {
        self.table = HashTableDup::default();
        self.current_bucket = None;
        self.current_left = None;
        self.matches.clear();
        self.match_idx = 0;
        self.lookahead.reset();
    }
}

impl Operator for HashJoin {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        // Dropping the partitions releases their scratch files before the
        // new ones are allocated.
        self.partitions = None;
        self.reset_matching_state();

        self.left.restart()?;
        self.right.restart()?;
        let partitions = Self::build_partitions(
            self.left.as_mut(),
            self.right.as_mut(),
            self.lcol,
            self.rcol,
            &self.scratch,
        )?;
        self.partitions = Some(partitions);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.partitions = None;
        self.reset_matching_state();
        self.left.close();
        self.right.close();
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.open {
            return Err(DbError::Executor("hash join is closed".into()));
        }
        if !self.lookahead.is_computed() {
            let next = self.find_next()?;
            self.lookahead.set(next);
        }
        Ok(self.lookahead.is_ready())
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::Executor("hash join has no next tuple".into()));
        }
        self.lookahead
            .take()
            .ok_or_else(|| DbError::Executor("hash join lookahead lost its tuple".into()))
    }

    fn explain(&self, depth: usize) -> String {
        format!(
            "{}HashJoin: left #{} = right #{}\n{}\n{}",
            indent(depth),
            self.lcol,
            self.rcol,
            self.left.explain(depth + 1),
            self.right.explain(depth + 1)
        )
    }
}
