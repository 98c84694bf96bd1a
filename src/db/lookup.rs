//! The database's public read/write contract: lookup, insert/overwrite/
//! set, delete, existence, random sampling, expiration installation, and
//! atomic swap.

use std::rc::Rc;

use super::expire::{expire_if_needed, Stats};
use super::reclaim::Reclaimer;
use super::table::{Database, Key};
use crate::clock::{MillisTimestamp, Role};
use crate::config::{Config, DeleteMode, MaxMemoryPolicy};
use crate::hooks::KeyspaceHooks;
use crate::value::Value;

/// Flags a caller passes to [`lookup_read`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupFlags {
    /// Skip the access-metadata update (e.g. a background save walking
    /// the keyspace shouldn't perturb LRU/LFU state).
    pub no_touch: bool,
    /// This call is on behalf of the replication link itself, not a
    /// regular client command.
    pub is_replication_link: bool,
    /// The command being served is read-only.
    pub is_read_only_command: bool,
}

/// `lookup_read`: triggers lazy expiration, updates
/// hit/miss counters, updates access_meta unless suppressed.
pub fn lookup_read<'db>(
    db: &'db mut Database,
    key: &[u8],
    flags: LookupFlags,
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    stats: &mut Stats,
) -> Option<&'db Value> {
    let expired = expire_if_needed(db, key, role, hooks, config, stats);
    if expired && role.is_primary() {
        stats.keyspace_misses += 1;
        return None;
    }
    if expired && !role.is_primary() && !flags.is_replication_link && flags.is_read_only_command {
        stats.keyspace_misses += 1;
        return None;
    }

    match db.main.get(key) {
        None => {
            stats.keyspace_misses += 1;
            None
        }
        Some(value) => {
            stats.keyspace_hits += 1;
            if !flags.no_touch {
                value.touch(policy_of(config), role.effective_now());
            }
            db.main.get(key)
        }
    }
}

fn policy_of(config: &Config) -> MaxMemoryPolicy {
    config.maxmemory_policy
}

/// `lookup_write`: triggers lazy expiration, never touches
/// access_meta.
pub fn lookup_write<'db>(
    db: &'db mut Database,
    key: &[u8],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    stats: &mut Stats,
) -> Option<&'db Value> {
    expire_if_needed(db, key, role, hooks, config, stats);
    db.main.get(key)
}

/// `add`: precondition is that `key` is absent; panics (assertion
/// failure) if violated by a caller that didn't check first.
pub fn add(db: &mut Database, key: &[u8], value: Value) {
    assert!(!db.main.contains_key(key), "add: key already present");
    let k: Key = Rc::from(key);
    db.main.insert(k, value);
}

/// `overwrite`: precondition is that `key` is present;
/// expiration and access_meta are carried over (the same `main` entry for
/// `expires` isn't touched, and the new `Value` inherits nothing from the
/// old one by construction — callers that want access_meta carried over
/// pass it in already set).
pub fn overwrite(db: &mut Database, key: &[u8], value: Value) {
    let existing_key = db
        .main
        .get_key_value(key)
        .map(|(k, _)| Rc::clone(k))
        .expect("overwrite: key must be present");
    db.main.insert(existing_key, value);
}

/// `set`: inserts or replaces, always succeeds, clears any
/// prior expiration.
pub fn set(db: &mut Database, key: &[u8], value: Value) {
    let k: Key = match db.main.get_key_value(key) {
        Some((existing, _)) => Rc::clone(existing),
        None => Rc::from(key),
    };
    db.main.insert(Rc::clone(&k), value);
    db.expires.remove(key);
}

/// `delete_sync`: removes from `expires` first, then `main`,
/// releasing the value immediately. Returns whether a key was removed.
pub fn delete_sync(db: &mut Database, key: &[u8]) -> bool {
    db.expires.remove(key);
    db.main.remove(key).is_some()
}

/// `delete_lazy`: unlinks from both tables, handing the value
/// off to `reclaimer` instead of dropping it inline. Returns whether a key
/// was unlinked.
pub fn delete_lazy(db: &mut Database, key: &[u8], reclaimer: &Reclaimer) -> bool {
    db.expires.remove(key);
    match db.main.remove(key) {
        Some(value) => {
            reclaimer.reclaim_value(value);
            true
        }
        None => false,
    }
}

/// `delete`: config selects sync vs. lazy.
pub fn delete(db: &mut Database, key: &[u8], config: &Config, reclaimer: &Reclaimer) -> bool {
    match config.server_del_mode() {
        DeleteMode::Sync => delete_sync(db, key),
        DeleteMode::Lazy => delete_lazy(db, key, reclaimer),
    }
}

/// `exists`: does not update access_meta.
pub fn exists(db: &Database, key: &[u8]) -> bool {
    db.main.contains_key(key)
}

/// Bound on `random_key`'s retry loop when every sampled key turns out to
/// be logically-but-not-yet-physically expired.
const RANDOM_KEY_MAX_RETRIES: usize = 100;

/// `random_key`: samples `main`; if the sample is volatile,
/// checks expiration (without deleting — this is a read-only sample, not a
/// `lookup_read`). Bounds retries at 100 to avoid looping forever when
/// every key is volatile and logically expired on a replica.
pub fn random_key(db: &Database, role: Role) -> Option<Key> {
    if db.main.is_empty() {
        return None;
    }
    let now = role.effective_now();
    let mut sampled = None;
    for i in 0..RANDOM_KEY_MAX_RETRIES {
        let idx = pseudo_sample_index(db.main.len(), i);
        let (key, _) = db.main.iter().nth(idx)?;
        sampled = Some(Rc::clone(key));
        match db.expires.get(key) {
            Some(&deadline) if now > deadline => continue,
            _ => return sampled,
        }
    }
    sampled
}

/// Deterministic stand-in for a random sample index. The engine has no
/// PRNG dependency elsewhere, so each retry just
/// perturbs the index with a fixed odd stride, which still visits a
/// spread of the table across the retry budget.
fn pseudo_sample_index(len: usize, attempt: usize) -> usize {
    (attempt.wrapping_mul(2654435761) + attempt) % len
}

/// `set_expire`: precondition is that `key` is present in `main`.
pub fn set_expire(db: &mut Database, key: &[u8], deadline_ms: MillisTimestamp) {
    let k: Key = db
        .main
        .get_key_value(key)
        .map(|(k, _)| Rc::clone(k))
        .expect("set_expire: key must be present");
    db.expires.insert(k, deadline_ms);
}

/// `get_expire`.
pub fn get_expire(db: &Database, key: &[u8]) -> Option<MillisTimestamp> {
    db.expires.get(key).copied()
}

/// `remove_expire`.
pub fn remove_expire(db: &mut Database, key: &[u8]) -> bool {
    db.expires.remove(key).is_some()
}

/// `swap`: swaps the `main`/`expires`/`avg_ttl` triples only —
/// `watched`/`blocking`/`ready` stay with the database id. Rescanning both
/// databases for clients blocked on a now-present list key is the hook
/// layer's job (`signal_list_ready`); the core only performs the swap
/// and leaves that walk to the caller.
pub fn swap(a: &mut Database, b: &mut Database) {
    std::mem::swap(&mut a.main, &mut b.main);
    std::mem::swap(&mut a.expires, &mut b.expires);
    std::mem::swap(&mut a.avg_ttl, &mut b.avg_ttl);
}

/// `empty`: clears `main`/`expires`, optionally handing the
/// tables off to the reclaimer instead of dropping them inline. Returns
/// the number of keys removed.
pub fn empty(db: &mut Database, async_flag: bool, reclaimer: &Reclaimer) -> usize {
    let count = db.main.len();
    db.expires.clear();
    if async_flag {
        let table = std::mem::replace(&mut db.main, std::collections::HashMap::with_hasher(
            crate::xxhash::XxHash64Builder::new(db.id as u64),
        ));
        reclaimer.reclaim_table(table);
    } else {
        db.main.clear();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoopHooks;
    use crate::value::{AccessMeta, Encoding, ValueType};

    fn val(s: &str) -> Value {
        Value::new(ValueType::String, Encoding::Raw(s.as_bytes().to_vec()), AccessMeta::Disabled)
    }

    #[test]
    fn add_then_lookup_read_hits() {
        let mut db = Database::new(0);
        add(&mut db, b"k", val("v"));
        let hooks = NoopHooks;
        let config = Config::default();
        let mut stats = Stats::default();
        let v = lookup_read(&mut db, b"k", LookupFlags::default(), Role::Primary, &hooks, &config, &mut stats);
        assert!(v.is_some());
        assert_eq!(stats.keyspace_hits, 1);
    }

    #[test]
    #[should_panic]
    fn add_panics_if_key_already_present() {
        let mut db = Database::new(0);
        add(&mut db, b"k", val("v"));
        add(&mut db, b"k", val("v2"));
    }

    #[test]
    fn set_clears_prior_expiration() {
        let mut db = Database::new(0);
        set(&mut db, b"k", val("v"));
        set_expire(&mut db, b"k", 1000);
        assert_eq!(get_expire(&db, b"k"), Some(1000));
        set(&mut db, b"k", val("v2"));
        assert_eq!(get_expire(&db, b"k"), None);
    }

    #[test]
    fn delete_sync_removes_from_both_tables() {
        let mut db = Database::new(0);
        set(&mut db, b"k", val("v"));
        set_expire(&mut db, b"k", 1000);
        assert!(delete_sync(&mut db, b"k"));
        assert!(!exists(&db, b"k"));
        assert_eq!(get_expire(&db, b"k"), None);
        assert!(!delete_sync(&mut db, b"k"));
    }

    #[test]
    fn delete_lazy_hands_value_to_reclaimer() {
        let mut db = Database::new(0);
        set(&mut db, b"k", val("v"));
        let reclaimer = Reclaimer::new();
        assert!(delete_lazy(&mut db, b"k", &reclaimer));
        assert!(!exists(&db, b"k"));
    }

    #[test]
    fn random_key_returns_none_on_empty_database() {
        let db = Database::new(0);
        assert_eq!(random_key(&db, Role::Primary), None);
    }

    #[test]
    fn random_key_samples_an_existing_key() {
        let mut db = Database::new(0);
        for i in 0..10 {
            set(&mut db, format!("k{i}").as_bytes(), val("v"));
        }
        let k = random_key(&db, Role::Primary).unwrap();
        assert!(exists(&db, &k));
    }

    #[test]
    fn swap_exchanges_main_and_expires_but_not_id() {
        let mut a = Database::new(0);
        let mut b = Database::new(1);
        set(&mut a, b"only_in_a", val("v"));
        set(&mut b, b"only_in_b", val("v"));
        swap(&mut a, &mut b);
        assert!(exists(&a, b"only_in_b"));
        assert!(exists(&b, b"only_in_a"));
        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 1);
    }

    #[test]
    fn empty_sync_clears_immediately() {
        let mut db = Database::new(0);
        set(&mut db, b"k", val("v"));
        let reclaimer = Reclaimer::new();
        let removed = empty(&mut db, false, &reclaimer);
        assert_eq!(removed, 1);
        assert!(db.is_empty());
    }

    #[test]
    fn empty_async_hands_table_to_reclaimer() {
        let mut db = Database::new(0);
        set(&mut db, b"k", val("v"));
        let reclaimer = Reclaimer::new();
        let removed = empty(&mut db, true, &reclaimer);
        assert_eq!(removed, 1);
        assert!(db.is_empty());
    }
}
