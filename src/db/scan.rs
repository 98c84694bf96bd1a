//! SCAN cursor algorithm.
//!
//! `std::collections::HashMap` exposes no bucket array to walk directly, so
//! this reimplements the documented guarantee ("every key present
//! throughout the scan is visited at least once, resizing tolerated") on
//! top of it: each call derives a virtual bucket count from the table's
//! current length, assigns every live key to a bucket by hashing it with
//! the table's own `BuildHasher`, and advances the cursor with the
//! reversed-bit increment. Recomputing the bucket count fresh on every
//! call is what gives the resize tolerance — a real open-addressing table
//! would get this from its physical layout, so this earns it back by
//! re-deriving the same logical partition every time instead.

use std::hash::BuildHasher;

use super::table::{Database, Key};
use crate::ziplist::{EntryData, Ziplist};

/// Default advisory iteration budget when the caller doesn't specify one.
pub const DEFAULT_COUNT_HINT: usize = 10;

/// Reverse the low `nbits` bits of `v`.
fn reverse_bits(v: u64, nbits: u32) -> u64 {
    if nbits == 0 {
        0
    } else {
        v.reverse_bits() >> (64 - nbits)
    }
}

/// Advance `cur` by the reversed-bit-increment rule over an `nbits`-bit
/// cursor space.
fn next_cursor(cur: u64, nbits: u32) -> u64 {
    if nbits == 0 {
        return 0;
    }
    let mask = (1u64 << nbits) - 1;
    let rev = reverse_bits(cur & mask, nbits);
    let rev_next = rev.wrapping_add(1) & mask;
    reverse_bits(rev_next, nbits)
}

/// Number of bits needed so that `2^nbits >= len`, floored at 1.
fn bucket_bits(len: usize) -> u32 {
    if len <= 1 {
        1
    } else {
        (usize::BITS - (len - 1).leading_zeros()).max(1)
    }
}

/// Minimal glob matcher supporting `*` (any run) and `?` (single byte),
/// the two wildcards the keyspace-event/SCAN surface actually documents.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    fn rec(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => rec(&p[1..], t) || (!t.is_empty() && rec(p, &t[1..])),
            (Some(b'?'), Some(_)) => rec(&p[1..], &t[1..]),
            (Some(pc), Some(tc)) if pc == tc => rec(&p[1..], &t[1..]),
            _ => false,
        }
    }
    rec(pattern, text)
}

/// Scan the database's `main` table starting at `cursor`.
/// Returns `(next_cursor, matched_keys)`; `next_cursor == 0` means the scan
/// has completed a full cycle.
pub fn scan(
    db: &Database,
    cursor: u64,
    pattern: Option<&[u8]>,
    count_hint: usize,
) -> (u64, Vec<Key>) {
    if db.main.is_empty() {
        return (0, Vec::new());
    }
    let count_hint = count_hint.max(1);
    let nbits = bucket_bits(db.main.len());
    let mask = (1u64 << nbits) - 1;
    let bucket_budget = count_hint * 10;

    let mut cur = cursor & mask;
    let mut emitted = Vec::new();
    let mut buckets_visited = 0usize;

    loop {
        for key in db.main.keys() {
            if db.main.hasher().hash_one(key) & mask == cur {
                if pattern.map_or(true, |p| glob_match(p, key)) {
                    emitted.push(key.clone());
                }
            }
        }
        buckets_visited += 1;
        cur = next_cursor(cur, nbits);
        if cur == 0 {
            return (0, emitted);
        }
        if emitted.len() >= count_hint || buckets_visited >= bucket_budget {
            return (cur, emitted);
        }
    }
}

/// Small-container SCAN variant (HSCAN/SSCAN/ZSCAN over a ziplist-encoded
/// hash/set/zset): the whole container is emitted in one call and the
/// cursor always resets to 0.
pub fn scan_small_container(zl: &Ziplist) -> (u64, Vec<EntryData<'_>>) {
    let mut out = Vec::new();
    let mut cur = zl.first();
    while let Some(c) = cur {
        out.push(zl.get(c));
        cur = zl.next(c);
    }
    (0, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_bit_increment_visits_every_residue_before_returning_to_zero() {
        let nbits = 3;
        let mut cur = 0u64;
        let mut seen = vec![false; 1 << nbits];
        loop {
            seen[cur as usize] = true;
            cur = next_cursor(cur, nbits);
            if cur == 0 {
                break;
            }
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn glob_star_and_question_mark() {
        assert!(glob_match(b"foo*", b"foobar"));
        assert!(glob_match(b"f?o", b"foo"));
        assert!(!glob_match(b"f?o", b"fooo"));
        assert!(glob_match(b"*", b"anything"));
        assert!(!glob_match(b"abc", b"abd"));
    }

    #[test]
    fn scan_completes_and_visits_every_key() {
        let mut db = Database::new(0);
        for i in 0..200 {
            let key: Key = Database::intern_key(format!("k{i}").as_bytes());
            db.main.insert(
                key,
                crate::value::Value::new(
                    crate::value::ValueType::String,
                    crate::value::Encoding::Raw(b"v".to_vec()),
                    crate::value::AccessMeta::Disabled,
                ),
            );
        }

        let mut cursor = 0u64;
        let mut seen = std::collections::HashSet::new();
        loop {
            let (next, batch) = scan(&db, cursor, None, 10);
            for k in batch {
                seen.insert(k);
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(seen.len(), 200);
    }

    #[test]
    fn scan_on_empty_database_terminates_immediately() {
        let db = Database::new(0);
        assert_eq!(scan(&db, 0, None, 10), (0, Vec::new()));
    }

    /// Every key present at scan start and still present at scan end is
    /// reported at least once, even if keys are inserted mid-scan (which
    /// may itself resize the virtual bucket space).
    #[test]
    fn scan_reports_every_key_present_for_the_whole_scan_despite_concurrent_growth() {
        let mut db = Database::new(0);
        for i in 0..50 {
            let key: Key = Database::intern_key(format!("orig{i}").as_bytes());
            db.main.insert(
                key,
                crate::value::Value::new(
                    crate::value::ValueType::String,
                    crate::value::Encoding::Raw(b"v".to_vec()),
                    crate::value::AccessMeta::Disabled,
                ),
            );
        }

        let mut cursor = 0u64;
        let mut seen = std::collections::HashSet::new();
        let mut grown = false;
        loop {
            let (next, batch) = scan(&db, cursor, None, 10);
            for k in batch {
                seen.insert(k);
            }
            if !grown {
                // Insert more keys partway through, mimicking a mutator
                // running concurrently between cooperative SCAN calls.
                for i in 0..200 {
                    let key: Key = Database::intern_key(format!("grown{i}").as_bytes());
                    db.main.insert(
                        key,
                        crate::value::Value::new(
                            crate::value::ValueType::String,
                            crate::value::Encoding::Raw(b"v".to_vec()),
                            crate::value::AccessMeta::Disabled,
                        ),
                    );
                }
                grown = true;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        for i in 0..50 {
            let key = format!("orig{i}").into_bytes();
            assert!(seen.contains(key.as_slice()), "missing original key {i}");
        }
    }
}
