//! Hash index implementation using static hashing with overflow chains.
//!
//! Provides O(1) average-case lookups for equality predicates, plus a
//! bucket-ordered scan used by the partitioned hash join: `BucketScan`
//! returns every entry grouped contiguously by ascending bucket id and can
//! report the bucket id of the upcoming entry without consuming it.
//!
//! Entries are `(SearchKey, RecordId)` pairs; the bucket id of a key is
//! `SearchKey::hash_u64() % num_buckets`, with the bucket count recorded in
//! the file header so two indexes can be checked for a shared modulus.

use common::{DbError, DbResult, PageId, RecordId, SearchKey};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Page size for hash index storage.
const PAGE_SIZE: usize = 4096;

/// Number of primary hash buckets (fixed for simplicity).
pub const NUM_BUCKETS: u32 = 256;

/// Maximum entries per bucket page before chaining an overflow page.
const MAX_BUCKET_ENTRIES: usize = 40;

/// Hash index using static hashing with overflow chains.
///
/// Layout:
/// - Page 0: Header (num_pages, num_buckets)
/// - Pages 1..257: Primary buckets
/// - Pages 257+: Overflow buckets
pub struct HashIndex {
    file: File,
    /// Total number of pages allocated.
    num_pages: u64,
    /// Hash modulus; fixed at creation.
    num_buckets: u32,
}

/// A bucket page containing key-address entries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HashBucket {
    entries: Vec<(SearchKey, RecordId)>,
    /// Pointer to overflow bucket page (0 = none).
    overflow: u64,
}

/// Header stored at the beginning of the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HashHeader {
    num_pages: u64,
    num_buckets: u32,
}

impl HashIndex {
    /// Create a new hash index file.
    pub fn create(path: &Path) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| DbError::Index(format!("failed to create hash index: {}", e)))?;

        // Page 0 = header, pages 1..NUM_BUCKETS+1 = primary buckets
        let num_pages = 1 + NUM_BUCKETS as u64;

        let mut index = Self {
            file,
            num_pages,
            num_buckets: NUM_BUCKETS,
        };

        index.write_header()?;

        let empty_bucket = HashBucket::default();
        for i in 0..NUM_BUCKETS as u64 {
            index.write_bucket(PageId(1 + i), &empty_bucket)?;
        }

        Ok(index)
    }

    /// Open an existing hash index file.
    pub fn open(path: &Path) -> DbResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| DbError::Index(format!("failed to open hash index: {}", e)))?;

        let mut buf = vec![0u8; PAGE_SIZE];
        file.seek(SeekFrom::Start(0))
            .map_err(|e| DbError::Index(format!("seek error: {}", e)))?;
        file.read_exact(&mut buf)
            .map_err(|e| DbError::Index(format!("read error: {}", e)))?;

        let header: HashHeader = bincode::serde::decode_from_slice(&buf, bincode::config::legacy())
            .map_err(|e| DbError::Index(format!("failed to decode header: {}", e)))?
            .0;

        Ok(Self {
            file,
            num_pages: header.num_pages,
            num_buckets: header.num_buckets,
        })
    }

    /// The hash modulus this index was created with.
    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Search for all record addresses matching the given key exactly.
    pub fn search(&mut self, key: &SearchKey) -> DbResult<Vec<RecordId>> {
        let bucket_idx = key.bucket(self.num_buckets);
        let mut results = Vec::new();

        // Walk the chain of buckets
        let mut page_id = PageId(1 + bucket_idx as u64);
        loop {
            let bucket = self.read_bucket(page_id)?;

            for (k, rid) in &bucket.entries {
                if k == key {
                    results.push(*rid);
                }
            }

            if bucket.overflow == 0 {
                break;
            }
            page_id = PageId(bucket.overflow);
        }

        Ok(results)
    }

    /// Insert a key-address pair into the index.
    pub fn insert(&mut self, key: &SearchKey, rid: RecordId) -> DbResult<()> {
        let bucket_idx = key.bucket(self.num_buckets);
        let primary_page = PageId(1 + bucket_idx as u64);

        // Find the last bucket in the chain with space
        let mut page_id = primary_page;
        loop {
            let mut bucket = self.read_bucket(page_id)?;

            if bucket.entries.len() < MAX_BUCKET_ENTRIES {
                bucket.entries.push((key.clone(), rid));
                self.write_bucket(page_id, &bucket)?;
                return Ok(());
            }

            if bucket.overflow == 0 {
                // No overflow bucket, create one
                let overflow_page = PageId(self.num_pages);
                self.num_pages += 1;

                bucket.overflow = overflow_page.0;
                self.write_bucket(page_id, &bucket)?;

                let new_bucket = HashBucket {
                    entries: vec![(key.clone(), rid)],
                    overflow: 0,
                };
                self.write_bucket(overflow_page, &new_bucket)?;
                return Ok(());
            }

            page_id = PageId(bucket.overflow);
        }
    }

    /// Flush all changes to disk.
    pub fn flush(&mut self) -> DbResult<()> {
        self.write_header()?;
        self.file
            .sync_all()
            .map_err(|e| DbError::Index(format!("sync error: {}", e)))?;
        Ok(())
    }

    /// Read the full chain of pages for one bucket.
    fn read_chain(&mut self, bucket_idx: u32) -> DbResult<Vec<(SearchKey, RecordId)>> {
        let mut entries = Vec::new();
        let mut page_id = PageId(1 + bucket_idx as u64);
        loop {
            let bucket = self.read_bucket(page_id)?;
            entries.extend(bucket.entries);
            if bucket.overflow == 0 {
                break;
            }
            page_id = PageId(bucket.overflow);
        }
        Ok(entries)
    }

    fn read_bucket(&mut self, page_id: PageId) -> DbResult<HashBucket> {
        let offset = page_id.0 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| DbError::Index(format!("seek error: {}", e)))?;

        let mut buf = vec![0u8; PAGE_SIZE];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| DbError::Index(format!("read error: {}", e)))?;

        let bucket: HashBucket = bincode::serde::decode_from_slice(&buf, bincode::config::legacy())
            .map_err(|e| DbError::Index(format!("failed to decode bucket: {}", e)))?
            .0;

        Ok(bucket)
    }

    fn write_bucket(&mut self, page_id: PageId, bucket: &HashBucket) -> DbResult<()> {
        let offset = page_id.0 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| DbError::Index(format!("seek error: {}", e)))?;

        let encoded = bincode::serde::encode_to_vec(bucket, bincode::config::legacy())
            .map_err(|e| DbError::Index(format!("failed to encode bucket: {}", e)))?;

        let mut buf = vec![0u8; PAGE_SIZE];
        buf[..encoded.len()].copy_from_slice(&encoded);

        self.file
            .write_all(&buf)
            .map_err(|e| DbError::Index(format!("write error: {}", e)))?;

        Ok(())
    }

    fn write_header(&mut self) -> DbResult<()> {
        let header = HashHeader {
            num_pages: self.num_pages,
            num_buckets: self.num_buckets,
        };

        let encoded = bincode::serde::encode_to_vec(&header, bincode::config::legacy())
            .map_err(|e| DbError::Index(format!("failed to encode header: {}", e)))?;

        let mut buf = vec![0u8; PAGE_SIZE];
        buf[..encoded.len()].copy_from_slice(&encoded);

        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| DbError::Index(format!("seek error: {}", e)))?;
        self.file
            .write_all(&buf)
            .map_err(|e| DbError::Index(format!("write error: {}", e)))?;

        Ok(())
    }
}

/// Cursor over the record addresses stored under one exact key.
///
/// Matching addresses are materialized when the scan opens, so iteration
/// never touches the index file again.
pub struct HashScan {
    rids: Vec<RecordId>,
    pos: usize,
}

impl HashScan {
    pub fn open(path: &Path, key: &SearchKey) -> DbResult<Self> {
        let mut index = HashIndex::open(path)?;
        let rids = index.search(key)?;
        Ok(Self { rids, pos: 0 })
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.rids.len()
    }

    pub fn next(&mut self) -> Option<RecordId> {
        let rid = self.rids.get(self.pos).copied();
        if rid.is_some() {
            self.pos += 1;
        }
        rid
    }
}

/// Cursor over ALL index entries in ascending bucket-id order.
///
/// All entries of one bucket are returned contiguously; `peek_bucket`
/// reports the bucket id of the entry `next` would return, without
/// consuming it. Chains are loaded one bucket at a time, so memory use is
/// bounded by the largest bucket.
pub struct BucketScan {
    index: HashIndex,
    /// Next primary bucket to load.
    next_bucket: u32,
    /// Loaded entries tagged with their bucket id.
    queue: VecDeque<(u32, SearchKey, RecordId)>,
}

impl BucketScan {
    pub fn open(path: &Path) -> DbResult<Self> {
        let index = HashIndex::open(path)?;
        Ok(Self {
            index,
            next_bucket: 0,
            queue: VecDeque::new(),
        })
    }

    /// The hash modulus of the underlying index.
    pub fn bucket_count(&self) -> u32 {
        self.index.num_buckets()
    }

    pub fn has_next(&mut self) -> DbResult<bool> {
        self.fill_queue()?;
        Ok(!self.queue.is_empty())
    }

    /// Bucket id of the entry `next` would return, if any. Does not consume.
    pub fn peek_bucket(&mut self) -> DbResult<Option<u32>> {
        self.fill_queue()?;
        Ok(self.queue.front().map(|(bucket, _, _)| *bucket))
    }

    pub fn next(&mut self) -> DbResult<Option<(SearchKey, RecordId)>> {
        self.fill_queue()?;
        Ok(self.queue.pop_front().map(|(_, key, rid)| (key, rid)))
    }

    fn fill_queue(&mut self) -> DbResult<()> {
        while self.queue.is_empty() && self.next_bucket < self.index.num_buckets() {
            let bucket = self.next_bucket;
            self.next_bucket += 1;
            for (key, rid) in self.index.read_chain(bucket)? {
                self.queue.push_back((bucket, key, rid));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
