//! The `Database` struct: `main`/`expires` plus the auxiliary tables a
//! command layer consults through hooks.

use std::collections::HashMap;
use std::rc::Rc;

use crate::clock::MillisTimestamp;
use crate::value::Value;
use crate::xxhash::XxHash64Builder;

/// A byte-string key, shared (never copied) between `main` and `expires`
/// — both tables hold the identical `Rc<[u8]>` handle.
pub type Key = Rc<[u8]>;

/// One logical database: `main`/`expires` plus the auxiliary tables
/// consumed only via hooks. `watched`/`blocking`/`ready`
/// are modeled as key sets here — the core never inspects their contents,
/// it only adds/removes/queries membership on behalf of the command layer
/// the hooks represent.
pub struct Database {
    pub(crate) id: usize,
    pub(crate) main: HashMap<Key, Value, XxHash64Builder>,
    pub(crate) expires: HashMap<Key, MillisTimestamp, XxHash64Builder>,
    pub(crate) watched: HashMap<Key, usize, XxHash64Builder>,
    pub(crate) blocking: HashMap<Key, usize, XxHash64Builder>,
    pub(crate) ready: HashMap<Key, (), XxHash64Builder>,
    /// Rolling estimate of mean remaining TTL across `expires`, consumed
    /// by an eviction sampler; the core only maintains it, never samples it.
    pub(crate) avg_ttl: f64,
}

impl Database {
    pub fn new(id: usize) -> Self {
        Database {
            id,
            main: HashMap::with_hasher(XxHash64Builder::new(id as u64)),
            expires: HashMap::with_hasher(XxHash64Builder::new(id as u64)),
            watched: HashMap::with_hasher(XxHash64Builder::new(id as u64)),
            blocking: HashMap::with_hasher(XxHash64Builder::new(id as u64)),
            ready: HashMap::with_hasher(XxHash64Builder::new(id as u64)),
            avg_ttl: 0.0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn len(&self) -> usize {
        self.main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }

    pub fn avg_ttl(&self) -> f64 {
        self.avg_ttl
    }

    /// Intern `key` bytes once; both `main` and `expires` reuse this `Rc`
    /// rather than copying.
    pub(crate) fn intern_key(bytes: &[u8]) -> Key {
        Rc::from(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_database_is_empty() {
        let db = Database::new(0);
        assert_eq!(db.id(), 0);
        assert_eq!(db.len(), 0);
        assert!(db.is_empty());
    }
}
