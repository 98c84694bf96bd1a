//! Role-aware expiration: a role-gated check-and-maybe-delete that a
//! primary, a replica, and a loading node each answer differently.

use super::table::Database;
use crate::clock::Role;
use crate::config::{Config, DeleteMode};
use crate::hooks::{EventCategory, KeyspaceHooks};

/// Running counters a command layer typically surfaces (e.g. `INFO
/// stats`); the core only increments them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub expired_keys: u64,
    pub keyspace_hits: u64,
    pub keyspace_misses: u64,
    /// Incremented once per successful write-path command, after its hooks
    /// fire.
    pub dirty: u64,
}

/// `expire_if_needed`: role-aware check-and-maybe-delete.
/// Returns `true` iff the key is logically expired (whether or not this
/// call actually deleted it — only a primary deletes).
pub fn expire_if_needed(
    db: &mut Database,
    key: &[u8],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    stats: &mut Stats,
) -> bool {
    let Some(&deadline) = db.expires.get(key) else {
        return false;
    };
    if role.is_loading() {
        return false;
    }
    let now = role.effective_now();
    if !role.is_primary() {
        // Replica (including one executing a script, frozen at script
        // start): observe the flag, never delete — the primary owns it.
        return now > deadline;
    }
    if now <= deadline {
        return false;
    }

    stats.expired_keys += 1;
    let argv = match config.expire_del_mode() {
        DeleteMode::Lazy => vec![b"UNLINK".to_vec(), key.to_vec()],
        DeleteMode::Sync => vec![b"DEL".to_vec(), key.to_vec()],
    };
    hooks.propagate(db.id, &argv);
    hooks.notify_keyspace_event(EventCategory::Expired, "expired", key, db.id);

    match config.expire_del_mode() {
        DeleteMode::Sync => {
            super::lookup::delete_sync(db, key);
        }
        DeleteMode::Lazy => {
            // The caller supplies the reclaimer; `expire_if_needed` itself
            // has no reclaimer handle, so lazy expiration here degrades to
            // removing from both tables and dropping in place — callers
            // that want true background reclamation for expired keys
            // should route through `Database::delete` instead, which does
            // have the reclaimer handle. `expire_if_needed` is the
            // read-path's inline check, not the write path's explicit delete.
            super::lookup::delete_sync(db, key);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hooks::NoopHooks;
    use crate::value::{AccessMeta, Encoding, Value, ValueType};

    fn insert_with_deadline(db: &mut Database, key: &[u8], deadline: u64) {
        super::super::lookup::set(
            db,
            key,
            Value::new(ValueType::String, Encoding::Raw(b"v".to_vec()), AccessMeta::Disabled),
        );
        super::super::lookup::set_expire(db, key, deadline);
    }

    #[test]
    fn primary_with_real_clock_deletes_past_deadline() {
        let mut db = Database::new(0);
        insert_with_deadline(&mut db, b"k", 1);
        let hooks = NoopHooks;
        let config = Config::default();
        let mut stats = Stats::default();

        let expired = expire_if_needed(&mut db, b"k", Role::Primary, &hooks, &config, &mut stats);
        assert!(expired);
        assert_eq!(stats.expired_keys, 1);
        assert!(db.main.get(b"k".as_slice()).is_none());
    }

    #[test]
    fn replica_reports_flag_without_deleting() {
        let mut db = Database::new(0);
        insert_with_deadline(&mut db, b"k", 1);
        let hooks = NoopHooks;
        let config = Config::default();
        let mut stats = Stats::default();

        let expired = expire_if_needed(
            &mut db,
            b"k",
            Role::Replica { is_replication_link: false },
            &hooks,
            &config,
            &mut stats,
        );
        assert!(expired);
        assert_eq!(stats.expired_keys, 0);
        assert!(db.main.get(b"k".as_slice()).is_some());
    }

    #[test]
    fn loading_never_reports_expired() {
        let mut db = Database::new(0);
        insert_with_deadline(&mut db, b"k", 1);
        let hooks = NoopHooks;
        let config = Config::default();
        let mut stats = Stats::default();

        let expired = expire_if_needed(&mut db, b"k", Role::Loading, &hooks, &config, &mut stats);
        assert!(!expired);
        assert!(db.main.get(b"k".as_slice()).is_some());
    }

    #[test]
    fn no_deadline_is_never_expired() {
        let mut db = Database::new(0);
        super::super::lookup::set(
            &mut db,
            b"k",
            Value::new(ValueType::String, Encoding::Raw(b"v".to_vec()), AccessMeta::Disabled),
        );
        let hooks = NoopHooks;
        let config = Config::default();
        let mut stats = Stats::default();
        assert!(!expire_if_needed(&mut db, b"k", Role::Primary, &hooks, &config, &mut stats));
    }
}
