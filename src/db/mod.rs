//! The database layer: the `Database` struct plus lookup,
//! expiration, SCAN, background reclamation, and the snapshot/replay
//! interface. Split into one file per concern.

pub mod expire;
pub mod lookup;
pub mod reclaim;
pub mod scan;
pub mod snapshot;
pub mod table;

pub use expire::{expire_if_needed, Stats};
pub use lookup::{
    add, delete, delete_lazy, delete_sync, empty, exists, get_expire, lookup_read, lookup_write,
    overwrite, random_key, remove_expire, set, set_expire, swap, LookupFlags,
};
pub use reclaim::Reclaimer;
pub use scan::{glob_match, scan, scan_small_container, DEFAULT_COUNT_HINT};
pub use snapshot::{LoadGuard, SnapshotEntry};
pub use table::{Database, Key};
