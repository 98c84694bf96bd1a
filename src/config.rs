//! Runtime configuration knobs.
//!
//! These are per-engine-instance, not per-build — a command layer picks
//! `max_databases` or `maxmemory_policy` at startup — so they live on a
//! single `Config` struct, one module, one set of named knobs, rather
//! than scattered compile-time constants.

/// Selects which half of `Value::access_meta` is meaningful and how it is
/// updated on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxMemoryPolicy {
    /// `access_meta` holds a 24-bit LRU clock in seconds.
    Lru,
    /// `access_meta` holds a 24-bit access-time-in-minutes / 8-bit LFU counter pair.
    Lfu,
    /// Neither policy is active; `access_meta` updates are skipped entirely.
    #[default]
    NoEviction,
}

/// Selects synchronous vs. background-handoff deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Sync,
    Lazy,
}

/// All engine-wide tunables in one place.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of the database array. Default 16.
    pub max_databases: usize,
    /// Per-value byte cap enforced by `StringOps`. Default 512 MiB.
    pub max_string_size: usize,
    /// DEL defaults to lazy reclamation when set.
    pub lazyfree_server_del: bool,
    /// Expiration-triggered delete is lazy when set.
    pub lazyfree_expire: bool,
    /// Selects the LRU/LFU/no-op access_meta update rule.
    pub maxmemory_policy: MaxMemoryPolicy,
    /// Whether the cluster slot-index hook is active.
    pub cluster_enabled: bool,
    /// Entry-count threshold above which a small list/hash/zset upgrades
    /// from a ziplist to its full encoding.
    pub ziplist_entry_threshold: usize,
    /// Per-entry byte-length threshold for the same upgrade decision.
    pub ziplist_value_threshold: usize,
    /// Size of the process-wide shared small-integer pool. Default 10000.
    pub small_integer_shared_max: i64,
}

impl Config {
    /// `DeleteMode` implied by `lazyfree_server_del` for an explicit `delete`.
    pub fn server_del_mode(&self) -> DeleteMode {
        if self.lazyfree_server_del {
            DeleteMode::Lazy
        } else {
            DeleteMode::Sync
        }
    }

    /// `DeleteMode` implied by `lazyfree_expire` for expiration-triggered deletes.
    pub fn expire_del_mode(&self) -> DeleteMode {
        if self.lazyfree_expire {
            DeleteMode::Lazy
        } else {
            DeleteMode::Sync
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_databases: 16,
            max_string_size: 512 * (1 << 20),
            lazyfree_server_del: false,
            lazyfree_expire: false,
            maxmemory_policy: MaxMemoryPolicy::default(),
            cluster_enabled: false,
            ziplist_entry_threshold: 128,
            ziplist_value_threshold: 64,
            small_integer_shared_max: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = Config::default();
        assert_eq!(c.max_databases, 16);
        assert_eq!(c.max_string_size, 512 * 1024 * 1024);
        assert_eq!(c.small_integer_shared_max, 10_000);
        assert_eq!(c.server_del_mode(), DeleteMode::Sync);
    }

    #[test]
    fn lazyfree_flags_select_mode() {
        let mut c = Config::default();
        c.lazyfree_server_del = true;
        c.lazyfree_expire = true;
        assert_eq!(c.server_del_mode(), DeleteMode::Lazy);
        assert_eq!(c.expire_del_mode(), DeleteMode::Lazy);
    }
}
