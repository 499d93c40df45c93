//! Leaf operators wrapping the storage cursors.
//!
//! The wrappers add no predicate logic: raw rows become schema-typed tuples
//! on demand, and every storage failure surfaces unchanged.

use crate::{indent, BucketAccess, Operator, SchemaRef, Tuple};
use common::{DbError, DbResult, RecordId, SearchKey};
use hash::{BucketScan, HashScan};
use std::path::{Path, PathBuf};
use storage::{HeapFile, HeapScan};

/// Sequential scan over every live row of a heap file.
///
/// Tuples come back in page/slot order at stable heap addresses, which a
/// hash join exploits through `last_rid`.
pub struct FileScan {
    schema: SchemaRef,
    heap_path: PathBuf,
    scan: Option<HeapScan>,
    last_rid: Option<RecordId>,
}

impl FileScan {
    pub fn new(schema: SchemaRef, heap_path: impl Into<PathBuf>) -> DbResult<Self> {
        let heap_path = heap_path.into();
        let scan = HeapScan::open(&heap_path)?;
        Ok(Self {
            schema,
            heap_path,
            scan: Some(scan),
            last_rid: None,
        })
    }
}

impl Operator for FileScan {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        self.scan = Some(HeapScan::open(&self.heap_path)?);
        self.last_rid = None;
        Ok(())
    }

    fn close(&mut self) {
        self.scan = None;
    }

    fn is_open(&self) -> bool {
        self.scan.is_some()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &mut self.scan {
            Some(scan) => scan.has_next(),
            None => Err(DbError::Executor("file scan is closed".into())),
        }
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        let scan = self
            .scan
            .as_mut()
            .ok_or_else(|| DbError::Executor("file scan is closed".into()))?;
        match scan.next()? {
            Some((rid, values)) => {
                self.last_rid = Some(rid);
                Tuple::new(self.schema.clone(), values)
            }
            None => Err(DbError::Executor("file scan has no next tuple".into())),
        }
    }

    fn explain(&self, depth: usize) -> String {
        format!(
            "{}FileScan: {} [{} cols]",
            indent(depth),
            self.heap_path.display(),
            self.schema.len()
        )
    }

    fn bucket_access(&self) -> BucketAccess {
        BucketAccess::Addressed {
            heap: self.heap_path.clone(),
        }
    }

    fn last_rid(&self) -> Option<RecordId> {
        self.last_rid
    }
}

/// Equality lookup through a hash index: every row whose indexed column
/// equals one search key, fetched from the heap by address.
pub struct KeyScan {
    schema: SchemaRef,
    index_path: PathBuf,
    heap_path: PathBuf,
    key: SearchKey,
    scan: Option<HashScan>,
    heap: Option<HeapFile>,
    last_rid: Option<RecordId>,
}

#[bon::bon]
impl KeyScan {
    /// Open a key scan using a builder.
    ///
    /// # Example
    /// ```ignore
    /// let scan = KeyScan::builder()
    ///     .schema(schema)
    ///     .index_path(index_path)
    ///     .key(SearchKey::new(Value::Int(42)))
    ///     .heap_path(heap_path)
    ///     .build()?;
    /// ```
    #[builder]
    pub fn new(
        schema: SchemaRef,
        index_path: PathBuf,
        key: SearchKey,
        heap_path: PathBuf,
    ) -> DbResult<Self> {
        let scan = HashScan::open(&index_path, &key)?;
        let heap = HeapFile::open(&heap_path)?;
        Ok(Self {
            schema,
            index_path,
            heap_path,
            key,
            scan: Some(scan),
            heap: Some(heap),
            last_rid: None,
        })
    }
}

impl Operator for KeyScan {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        self.scan = Some(HashScan::open(&self.index_path, &self.key)?);
        self.heap = Some(HeapFile::open(&self.heap_path)?);
        self.last_rid = None;
        Ok(())
    }

    fn close(&mut self) {
        self.scan = None;
        self.heap = None;
    }

    fn is_open(&self) -> bool {
        self.scan.is_some()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &self.scan {
            Some(scan) => Ok(scan.has_next()),
            None => Err(DbError::Executor("key scan is closed".into())),
        }
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        let (scan, heap) = match (&mut self.scan, &mut self.heap) {
            (Some(scan), Some(heap)) => (scan, heap),
            _ => return Err(DbError::Executor("key scan is closed".into())),
        };
        match scan.next() {
            Some(rid) => {
                let values = heap.get(rid)?;
                self.last_rid = Some(rid);
                Tuple::new(self.schema.clone(), values)
            }
            None => Err(DbError::Executor("key scan has no next tuple".into())),
        }
    }

    fn explain(&self, depth: usize) -> String {
        format!(
            "{}KeyScan: {} key={:?}",
            indent(depth),
            self.index_path.display(),
            self.key.value()
        )
    }

    fn bucket_access(&self) -> BucketAccess {
        BucketAccess::Bucketed {
            index: self.index_path.clone(),
            heap: self.heap_path.clone(),
        }
    }

    fn last_rid(&self) -> Option<RecordId> {
        self.last_rid
    }
}

/// Full scan of a hash index in ascending bucket-id order, fetching each
/// row from the heap by address.
///
/// `get_next_hash` exposes the bucket id of the upcoming tuple without
/// consuming it; the hash join drives its partition scans through it.
pub struct IndexScan {
    schema: SchemaRef,
    index_path: PathBuf,
    heap_path: PathBuf,
    scan: Option<BucketScan>,
    heap: Option<HeapFile>,
    last_rid: Option<RecordId>,
}

impl IndexScan {
    pub fn open(
        schema: SchemaRef,
        index_path: impl Into<PathBuf>,
        heap_path: impl Into<PathBuf>,
    ) -> DbResult<Self> {
        let index_path = index_path.into();
        let heap_path = heap_path.into();
        let scan = BucketScan::open(&index_path)?;
        let heap = HeapFile::open(&heap_path)?;
        Ok(Self {
            schema,
            index_path,
            heap_path,
            scan: Some(scan),
            heap: Some(heap),
            last_rid: None,
        })
    }

    /// Bucket id of the tuple the next `get_next` would return, or `None`
    /// at exhaustion. Non-consuming.
    pub fn get_next_hash(&mut self) -> DbResult<Option<u32>> {
        match &mut self.scan {
            Some(scan) => scan.peek_bucket(),
            None => Err(DbError::Executor("index scan is closed".into())),
        }
    }

    /// Hash modulus of the underlying index.
    pub fn bucket_count(&self) -> DbResult<u32> {
        match &self.scan {
            Some(scan) => Ok(scan.bucket_count()),
            None => Err(DbError::Executor("index scan is closed".into())),
        }
    }

    /// Advance to the next tuple, `None` at exhaustion. `get_next` layers
    /// the protocol error on top of this.
    pub(crate) fn next_tuple(&mut self) -> DbResult<Option<Tuple>> {
        let (scan, heap) = match (&mut self.scan, &mut self.heap) {
            (Some(scan), Some(heap)) => (scan, heap),
            _ => return Err(DbError::Executor("index scan is closed".into())),
        };
        match scan.next()? {
            Some((_, rid)) => {
                let values = heap.get(rid)?;
                self.last_rid = Some(rid);
                Ok(Some(Tuple::new(self.schema.clone(), values)?))
            }
            None => Ok(None),
        }
    }
}

impl Operator for IndexScan {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn restart(&mut self) -> DbResult<()> {
        self.scan = Some(BucketScan::open(&self.index_path)?);
        self.heap = Some(HeapFile::open(&self.heap_path)?);
        self.last_rid = None;
        Ok(())
    }

    fn close(&mut self) {
        self.scan = None;
        self.heap = None;
    }

    fn is_open(&self) -> bool {
        self.scan.is_some()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &mut self.scan {
            Some(scan) => scan.has_next(),
            None => Err(DbError::Executor("index scan is closed".into())),
        }
    }

    fn get_next(&mut self) -> DbResult<Tuple> {
        match self.next_tuple()? {
            Some(tuple) => Ok(tuple),
            None => Err(DbError::Executor("index scan has no next tuple".into())),
        }
    }

    fn explain(&self, depth: usize) -> String {
        format!(
            "{}IndexScan: {}",
            indent(depth),
            self.index_path.display()
        )
    }

    fn bucket_access(&self) -> BucketAccess {
        BucketAccess::Bucketed {
            index: self.index_path.clone(),
            heap: self.heap_path.clone(),
        }
    }

    fn last_rid(&self) -> Option<RecordId> {
        self.last_rid
    }
}

/// Build a hash index over one column of every row in a heap file.
/// Test and tooling helper; production indexes are maintained on insert.
pub fn build_index(heap_path: &Path, index_path: &Path, col: usize) -> DbResult<()> {
    let mut index = hash::HashIndex::create(index_path)?;
    let mut scan = HeapScan::open(heap_path)?;
    while let Some((rid, values)) = scan.next()? {
        let value = values
            .get(col)
            .ok_or_else(|| DbError::Index(format!("column {col} out of range")))?;
        index.insert(&SearchKey::new(value.clone()), rid)?;
    }
    index.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{drain_values, people_schema};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use types::Value;

    fn person(id: i64, name: &str) -> Vec<Value> {
        vec![Value::Int(id), Value::Text(name.into())]
    }

    fn populated_heap(dir: &Path) -> PathBuf {
        let path = dir.join("people.tbl");
        let mut heap = HeapFile::open(&path).unwrap();
        heap.insert(&person(1, "alice")).unwrap();
        heap.insert(&person(2, "bob")).unwrap();
        heap.insert(&person(3, "carol")).unwrap();
        path
    }

    #[test]
    fn file_scan_returns_all_rows_in_order() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());

        let mut scan = FileScan::new(people_schema(), &heap_path).unwrap();
        assert!(scan.is_open());
        assert_eq!(
            drain_values(&mut scan),
            vec![person(1, "alice"), person(2, "bob"), person(3, "carol")]
        );
    }

    #[test]
    fn file_scan_tracks_last_rid() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());

        let mut scan = FileScan::new(people_schema(), &heap_path).unwrap();
        assert_eq!(scan.last_rid(), None);

        let tuple = scan.get_next().unwrap();
        let rid = scan.last_rid().unwrap();

        let mut heap = HeapFile::open(&heap_path).unwrap();
        assert_eq!(heap.get(rid).unwrap(), tuple.values());
    }

    #[test]
    fn file_scan_restart_rewinds() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());

        let mut scan = FileScan::new(people_schema(), &heap_path).unwrap();
        scan.get_next().unwrap();
        scan.get_next().unwrap();

        scan.restart().unwrap();
        assert_eq!(scan.get_next().unwrap().values(), &person(1, "alice"));
        assert_eq!(scan.last_rid().is_some(), true);
    }

    #[test]
    fn file_scan_close_then_use_is_an_error() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());

        let mut scan = FileScan::new(people_schema(), &heap_path).unwrap();
        scan.close();
        assert!(!scan.is_open());
        assert!(matches!(scan.has_next(), Err(DbError::Executor(_))));
        assert!(matches!(scan.get_next(), Err(DbError::Executor(_))));
    }

    #[test]
    fn file_scan_get_next_past_end_is_an_error() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());

        let mut scan = FileScan::new(people_schema(), &heap_path).unwrap();
        while scan.has_next().unwrap() {
            scan.get_next().unwrap();
        }
        assert!(matches!(scan.get_next(), Err(DbError::Executor(_))));
    }

    #[test]
    fn key_scan_returns_only_matching_rows() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());
        let index_path = dir.path().join("people.idx");
        build_index(&heap_path, &index_path, 0).unwrap();

        let mut scan = KeyScan::builder()
            .schema(people_schema())
            .index_path(index_path)
            .key(SearchKey::new(Value::Int(2)))
            .heap_path(heap_path)
            .build()
            .unwrap();

        assert_eq!(drain_values(&mut scan), vec![person(2, "bob")]);
    }

    #[test]
    fn key_scan_with_duplicates_returns_them_all() {
        let dir = tempdir().unwrap();
        let heap_path = dir.path().join("dup.tbl");
        let mut heap = HeapFile::open(&heap_path).unwrap();
        heap.insert(&person(7, "first")).unwrap();
        heap.insert(&person(7, "second")).unwrap();
        heap.insert(&person(8, "other")).unwrap();
        let index_path = dir.path().join("dup.idx");
        build_index(&heap_path, &index_path, 0).unwrap();

        let mut scan = KeyScan::builder()
            .schema(people_schema())
            .index_path(index_path)
            .key(SearchKey::new(Value::Int(7)))
            .heap_path(heap_path)
            .build()
            .unwrap();

        assert_eq!(
            drain_values(&mut scan),
            vec![person(7, "first"), person(7, "second")]
        );
    }

    #[test]
    fn key_scan_restart_rewinds() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());
        let index_path = dir.path().join("people.idx");
        build_index(&heap_path, &index_path, 0).unwrap();

        let mut scan = KeyScan::builder()
            .schema(people_schema())
            .index_path(index_path)
            .key(SearchKey::new(Value::Int(3)))
            .heap_path(heap_path)
            .build()
            .unwrap();

        let first = drain_values(&mut scan);
        scan.restart().unwrap();
        assert_eq!(drain_values(&mut scan), first);
    }

    #[test]
    fn index_scan_visits_every_row_grouped_by_bucket() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());
        let index_path = dir.path().join("people.idx");
        build_index(&heap_path, &index_path, 0).unwrap();

        let mut scan = IndexScan::open(people_schema(), &index_path, &heap_path).unwrap();

        let mut rows = Vec::new();
        let mut last_bucket = None;
        while let Some(bucket) = scan.get_next_hash().unwrap() {
            if let Some(last) = last_bucket {
                assert!(bucket >= last);
            }
            last_bucket = Some(bucket);
            rows.push(scan.get_next().unwrap().values().to_vec());
        }
        rows.sort_by_key(|row| format!("{row:?}"));

        let mut expected = vec![person(1, "alice"), person(2, "bob"), person(3, "carol")];
        expected.sort_by_key(|row| format!("{row:?}"));
        assert_eq!(rows, expected);
    }

    #[test]
    fn index_scan_reports_bucket_count() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());
        let index_path = dir.path().join("people.idx");
        build_index(&heap_path, &index_path, 0).unwrap();

        let scan = IndexScan::open(people_schema(), &index_path, &heap_path).unwrap();
        assert_eq!(scan.bucket_count().unwrap(), hash::NUM_BUCKETS);
    }

    #[test]
    fn index_scan_has_next_is_idempotent() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());
        let index_path = dir.path().join("people.idx");
        build_index(&heap_path, &index_path, 0).unwrap();

        let mut scan = IndexScan::open(people_schema(), &index_path, &heap_path).unwrap();
        assert!(scan.has_next().unwrap());
        assert!(scan.has_next().unwrap());

        let mut count = 0;
        while scan.has_next().unwrap() {
            scan.get_next().unwrap();
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn explain_is_indented() {
        let dir = tempdir().unwrap();
        let heap_path = populated_heap(dir.path());

        let scan = FileScan::new(people_schema(), &heap_path).unwrap();
        assert!(scan.explain(0).starts_with("FileScan:"));
        assert!(scan.explain(2).starts_with("    FileScan:"));
    }
}
