//! Snapshot/replay interface: iteration over `(key, value,
//! optional deadline)` triples for dump, and single-entry replay for load.
//!
//! Loading always calls [`lookup::add`] (never `set`) and must see every
//! key as "not expired" regardless of its stored deadline — that's the
//! "process is replaying a log or loading a snapshot" branch already
//! implemented by [`crate::clock::Role::Loading`] in `db/expire.rs`;
//! [`LoadGuard`] just packages "I am loading" as a token so a replay loop
//! can't forget to pass that role.

use super::table::Database;
use crate::clock::Role;
use crate::value::Value;

/// One row of a full-database snapshot: an owned key, its value, and its
/// absolute expiration deadline if volatile.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub key: Vec<u8>,
    pub value: Value,
    pub expire_at: Option<u64>,
}

/// Iterate every live entry in `db` as `(key, value, deadline)` triples,
/// for serialization by an external snapshot writer — the on-disk format
/// is out of scope here, this only exposes the iteration surface.
pub fn iter(db: &Database) -> impl Iterator<Item = SnapshotEntry> + '_ {
    db.main.iter().map(move |(key, value)| SnapshotEntry {
        key: key.to_vec(),
        value: value.share(),
        expire_at: db.expires.get(key).copied(),
    })
}

/// A capability token asserting "a snapshot/log replay is in progress".
/// Its only purpose is to hand out [`Role::Loading`] so
/// that `expire_if_needed` unconditionally reports "not expired" for the
/// guard's lifetime, and to carry [`load_entry`]'s invariant that replay
/// always inserts via `add`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadGuard;

impl LoadGuard {
    pub fn role(&self) -> Role {
        Role::Loading
    }

    /// Replay one snapshot row into `db`. Always invokes `add` (never
    /// `set`) and installs the deadline verbatim if present, bypassing
    /// `expire_if_needed` entirely — there is nothing to check while
    /// loading.
    pub fn load_entry(&self, db: &mut Database, entry: SnapshotEntry) {
        super::lookup::add(db, &entry.key, entry.value);
        if let Some(deadline) = entry.expire_at {
            super::lookup::set_expire(db, &entry.key, deadline);
        }
    }
}
