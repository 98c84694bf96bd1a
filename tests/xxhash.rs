//! Integration tests for `src/xxhash.rs`'s role as the database's
//! `BuildHasher`.

use keyspace_engine::xxhash::{xxh32_oneshot, XxHash64Builder};
use std::collections::HashMap;

#[test]
fn oneshot_is_deterministic_and_seed_sensitive() {
    let a = xxh32_oneshot(b"hello, world", 42);
    let b = xxh32_oneshot(b"hello, world", 42);
    assert_eq!(a, b);

    let c = xxh32_oneshot(b"hello, world", 7);
    assert_ne!(a, c);
}

#[test]
fn build_hasher_works_as_a_hashmap_backend() {
    let mut map: HashMap<Vec<u8>, i32, XxHash64Builder> =
        HashMap::with_hasher(XxHash64Builder::new(0));
    map.insert(b"alpha".to_vec(), 1);
    map.insert(b"beta".to_vec(), 2);
    assert_eq!(map.get(b"alpha".as_slice()), Some(&1));
    assert_eq!(map.get(b"beta".as_slice()), Some(&2));
    assert_eq!(map.get(b"gamma".as_slice()), None);
}
