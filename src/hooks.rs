//! `KeyspaceHooks`: the narrow interfaces the engine calls out to for
//! everything explicitly out of scope — notification, replication,
//! blocked-client wakeup, watch invalidation, and cluster slot indexing.
//!
//! A plain trait with a no-op default implementation for tests is the
//! general shape for "the engine calls out, the host implements"; the
//! same role `NoopHooks` plays here that an in-memory fake backend plays
//! in storage-engine tests elsewhere.

/// Category tag passed to [`KeyspaceHooks::notify_keyspace_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Generic,
    String,
    List,
    Set,
    Hash,
    ZSet,
    Expired,
    Evicted,
}

/// Whether a key was added to or removed from a cluster hash slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    Added,
    Removed,
}

/// The five external collaborators the core consumes but never implements.
/// A command layer built on this engine supplies a concrete
/// implementation; the core only ever holds a `&dyn KeyspaceHooks`.
pub trait KeyspaceHooks {
    /// Fire-and-forget side channel to pub/sub subscribers.
    fn notify_keyspace_event(&self, category: EventCategory, event_name: &str, key: &[u8], db_id: usize);

    /// Queue a command for replicas and the append-only log.
    fn propagate(&self, db_id: usize, argv: &[Vec<u8>]);

    /// Wake clients blocked waiting on `key` becoming a non-empty list.
    fn signal_list_ready(&self, db_id: usize, key: &[u8]);

    /// Invalidate any optimistic-transaction watch on `key`.
    fn signal_modified_key(&self, db_id: usize, key: &[u8]);

    /// Maintain the cluster's slot-to-keys reverse index. No-op when
    /// cluster mode is disabled.
    fn slot_index_update(&self, key: &[u8], change: SlotChange);
}

/// A `KeyspaceHooks` that does nothing, for unit tests and any embedding
/// that doesn't need replication, pub/sub, or cluster support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl KeyspaceHooks for NoopHooks {
    fn notify_keyspace_event(&self, _category: EventCategory, _event_name: &str, _key: &[u8], _db_id: usize) {}
    fn propagate(&self, _db_id: usize, _argv: &[Vec<u8>]) {}
    fn signal_list_ready(&self, _db_id: usize, _key: &[u8]) {}
    fn signal_modified_key(&self, _db_id: usize, _key: &[u8]) {}
    fn slot_index_update(&self, _key: &[u8], _change: SlotChange) {}
}

/// Records every call instead of discarding it, so tests (in this crate and
/// downstream) can assert on the write-path's 3-hook call ordering (spec
/// §4.5: signal → notify → propagate).
#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub calls: std::cell::RefCell<Vec<String>>,
}

impl KeyspaceHooks for RecordingHooks {
    fn notify_keyspace_event(&self, _category: EventCategory, event_name: &str, key: &[u8], db_id: usize) {
        self.calls.borrow_mut().push(format!(
            "notify({event_name},{},{db_id})",
            String::from_utf8_lossy(key)
        ));
    }

    fn propagate(&self, db_id: usize, argv: &[Vec<u8>]) {
        self.calls.borrow_mut().push(format!("propagate({db_id},{})", argv.len()));
    }

    fn signal_list_ready(&self, db_id: usize, key: &[u8]) {
        self.calls
            .borrow_mut()
            .push(format!("list_ready({},{db_id})", String::from_utf8_lossy(key)));
    }

    fn signal_modified_key(&self, db_id: usize, key: &[u8]) {
        self.calls
            .borrow_mut()
            .push(format!("modified({},{db_id})", String::from_utf8_lossy(key)));
    }

    fn slot_index_update(&self, key: &[u8], change: SlotChange) {
        self.calls.borrow_mut().push(format!(
            "slot_index({},{:?})",
            String::from_utf8_lossy(key),
            change
        ));
    }
}
