use super::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use types::Value;

fn temp_index() -> (HashIndex, TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");
    let index = HashIndex::create(&path).unwrap();
    (index, temp, path)
}

fn rid(page: u64, slot: u16) -> RecordId {
    RecordId {
        page_id: PageId(page),
        slot,
    }
}

fn int_key(i: i64) -> SearchKey {
    SearchKey::new(Value::Int(i))
}

#[test]
fn create_empty_index() {
    let (index, _temp, _) = temp_index();
    assert_eq!(index.num_pages, 1 + NUM_BUCKETS as u64);
    assert_eq!(index.num_buckets(), NUM_BUCKETS);
}

#[test]
fn insert_and_search_single_key() {
    let (mut index, _temp, _) = temp_index();

    let key = int_key(42);
    index.insert(&key, rid(0, 0)).unwrap();

    let results = index.search(&key).unwrap();
    assert_eq!(results, vec![rid(0, 0)]);
}

#[test]
fn duplicate_keys_return_multiple_rids() {
    let (mut index, _temp, _) = temp_index();

    let key = int_key(42);
    index.insert(&key, rid(0, 0)).unwrap();
    index.insert(&key, rid(0, 1)).unwrap();

    let results = index.search(&key).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.contains(&rid(0, 0)));
    assert!(results.contains(&rid(0, 1)));
}

#[test]
fn search_misses_return_empty() {
    let (mut index, _temp, _) = temp_index();

    index.insert(&int_key(1), rid(0, 0)).unwrap();
    assert!(index.search(&int_key(2)).unwrap().is_empty());

    // Same underlying value, different type: must not match.
    assert!(index
        .search(&SearchKey::new(Value::Text("1".into())))
        .unwrap()
        .is_empty());
}

#[test]
fn persistence_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");

    let key = int_key(42);

    {
        let mut index = HashIndex::create(&path).unwrap();
        index.insert(&key, rid(0, 0)).unwrap();
        index.flush().unwrap();
    }

    {
        let mut index = HashIndex::open(&path).unwrap();
        assert_eq!(index.search(&key).unwrap(), vec![rid(0, 0)]);
        assert_eq!(index.num_buckets(), NUM_BUCKETS);
    }
}

#[test]
fn overflow_bucket_handling() {
    let (mut index, _temp, _) = temp_index();

    // Enough keys to overflow at least one bucket page.
    for i in 0..200 {
        index.insert(&int_key(i), rid(0, i as u16)).unwrap();
    }

    for i in 0..200 {
        let results = index.search(&int_key(i)).unwrap();
        assert_eq!(results.len(), 1, "key {} not found", i);
    }
}

#[test]
fn hash_scan_iterates_one_key() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");
    let mut index = HashIndex::create(&path).unwrap();

    let key = int_key(7);
    index.insert(&key, rid(0, 0)).unwrap();
    index.insert(&key, rid(0, 3)).unwrap();
    index.insert(&int_key(8), rid(0, 1)).unwrap();
    index.flush().unwrap();

    let mut scan = HashScan::open(&path, &key).unwrap();
    let mut seen = Vec::new();
    while scan.has_next() {
        seen.push(scan.next().unwrap());
    }
    assert_eq!(seen, vec![rid(0, 0), rid(0, 3)]);
    assert!(scan.next().is_none());
}

#[test]
fn bucket_scan_is_bucket_ordered() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");
    let mut index = HashIndex::create(&path).unwrap();

    for i in 0..100 {
        index.insert(&int_key(i), rid(0, i as u16)).unwrap();
    }
    index.flush().unwrap();

    let mut scan = BucketScan::open(&path).unwrap();
    let mut last_bucket = None;
    let mut count = 0;
    while let Some(bucket) = scan.peek_bucket().unwrap() {
        if let Some(last) = last_bucket {
            assert!(bucket >= last, "bucket ids must be non-decreasing");
        }
        last_bucket = Some(bucket);
        let (key, _) = scan.next().unwrap().unwrap();
        assert_eq!(key.bucket(NUM_BUCKETS), bucket);
        count += 1;
    }
    assert_eq!(count, 100);
}

#[test]
fn peek_bucket_does_not_consume() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");
    let mut index = HashIndex::create(&path).unwrap();
    index.insert(&int_key(5), rid(0, 0)).unwrap();
    index.flush().unwrap();

    let mut scan = BucketScan::open(&path).unwrap();
    let b1 = scan.peek_bucket().unwrap();
    let b2 = scan.peek_bucket().unwrap();
    assert_eq!(b1, b2);
    assert!(b1.is_some());

    let (key, _) = scan.next().unwrap().unwrap();
    assert_eq!(Some(key.bucket(NUM_BUCKETS)), b1);
    assert_eq!(scan.peek_bucket().unwrap(), None);
}

#[test]
fn bucket_scan_groups_same_bucket_contiguously() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");
    let mut index = HashIndex::create(&path).unwrap();

    for i in 0..300 {
        index.insert(&int_key(i % 10), rid(0, i as u16)).unwrap();
    }
    index.flush().unwrap();

    let mut scan = BucketScan::open(&path).unwrap();
    let mut seen_buckets = Vec::new();
    while let Some((key, _)) = scan.next().unwrap() {
        let bucket = key.bucket(NUM_BUCKETS);
        if seen_buckets.last() != Some(&bucket) {
            // A bucket id may only appear once as a run.
            assert!(
                !seen_buckets.contains(&bucket),
                "bucket {} split into multiple runs",
                bucket
            );
            seen_buckets.push(bucket);
        }
    }
}

#[test]
fn bucket_scan_of_empty_index() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.idx");
    HashIndex::create(&path).unwrap().flush().unwrap();

    let mut scan = BucketScan::open(&path).unwrap();
    assert!(!scan.has_next().unwrap());
    assert_eq!(scan.peek_bucket().unwrap(), None);
}

#[test]
fn text_and_bool_keys() {
    let (mut index, _temp, _) = temp_index();

    let text = SearchKey::new(Value::Text("hello world".into()));
    let yes = SearchKey::new(Value::Bool(true));
    let no = SearchKey::new(Value::Bool(false));

    index.insert(&text, rid(0, 0)).unwrap();
    index.insert(&yes, rid(0, 1)).unwrap();
    index.insert(&no, rid(0, 2)).unwrap();

    assert_eq!(index.search(&text).unwrap().len(), 1);
    assert_eq!(index.search(&yes).unwrap(), vec![rid(0, 1)]);
    assert_eq!(index.search(&no).unwrap(), vec![rid(0, 2)]);
}
