//! keyspace-engine — the in-memory keyspace engine of a single-node
//! key/value store.
//!
//! Owns a fixed-size array of logical databases; each database maps
//! byte-string keys to polymorphic values (string, list, set, hash,
//! sorted set) with an optional per-key absolute expiration. This crate
//! provides the primitives a command layer (GET/SET/DEL/RENAME/EXPIRE/
//! SCAN/…) builds on — it does not itself parse commands, speak a wire
//! protocol, replicate, persist, or route cluster slots; those are
//! external collaborators reached only through [`hooks::KeyspaceHooks`].
//!
//! ```
//! use keyspace_engine::{Engine, clock::Role, hooks::NoopHooks, stringops::SetCondition};
//!
//! let mut engine = Engine::new(Default::default());
//! let hooks = NoopHooks;
//! let config = engine.config().clone();
//! let shared = keyspace_engine::value::SharedIntPool::new(&config);
//! let mut stats = keyspace_engine::db::Stats::default();
//! let db = engine.db_mut(0);
//! keyspace_engine::stringops::set(
//!     db, b"greeting", b"hello", SetCondition::None, None,
//!     Role::Primary, &hooks, &config, &shared, &mut stats,
//! ).unwrap();
//! ```

pub mod clock;
pub mod config;
pub mod db;
pub mod dlist;
pub mod error;
pub mod hooks;
pub mod stringops;
pub mod value;
pub mod xxhash;
pub mod ziplist;

use config::Config;
use db::{Database, Reclaimer, Stats};
use value::SharedIntPool;

/// The engine: a fixed-size array of [`Database`]s plus the shared
/// resources every operation on them needs — the shared small-integer
/// pool and the background reclaimer.
///
/// This is the facade a command layer actually holds; `Database` itself
/// and the free functions in [`db`]/[`stringops`] stay plain data plus
/// plain functions operating on it, rather than methods on a god object.
pub struct Engine {
    databases: Vec<Database>,
    config: Config,
    shared_ints: SharedIntPool,
    reclaimer: Reclaimer,
    stats: Stats,
}

impl Engine {
    /// Build an engine with `config.max_databases` empty databases,
    /// numbered 0..max_databases so that a database's id always equals
    /// its index.
    pub fn new(config: Config) -> Self {
        let databases = (0..config.max_databases).map(Database::new).collect();
        let shared_ints = SharedIntPool::new(&config);
        Engine {
            databases,
            config,
            shared_ints,
            reclaimer: Reclaimer::new(),
            stats: Stats::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_ints(&self) -> &SharedIntPool {
        &self.shared_ints
    }

    pub fn reclaimer(&self) -> &Reclaimer {
        &self.reclaimer
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub fn db(&self, id: usize) -> &Database {
        &self.databases[id]
    }

    pub fn db_mut(&mut self, id: usize) -> &mut Database {
        &mut self.databases[id]
    }

    pub fn num_databases(&self) -> usize {
        self.databases.len()
    }

    /// Atomically swap two databases' `main`/`expires`/`avg_ttl` triples
    /// by id.
    pub fn swap_databases(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.databases.split_at_mut(hi);
        db::swap(&mut left[lo], &mut right[0]);
    }

    /// Empty a single database, returning the number of keys removed.
    pub fn flush_db(&mut self, id: usize, async_flag: bool) -> usize {
        db::empty(&mut self.databases[id], async_flag, &self.reclaimer)
    }

    /// Empty every database, returning the total number of keys removed.
    pub fn flush_all(&mut self, async_flag: bool) -> usize {
        self.databases
            .iter_mut()
            .map(|db| db::empty(db, async_flag, &self.reclaimer))
            .sum()
    }
}
