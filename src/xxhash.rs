//! Thin wrapper around the `xxhash-rust` crate, repurposed from a frame
//! checksum helper into the `BuildHasher` the database's hash tables key
//! their `main`/`expires` maps with.
//!
//! A hash table needs a streaming, seedable `std::hash::Hasher` evaluated
//! once per key on every lookup rather than a one-shot checksum, so this
//! keeps the "thin wrapper, nothing else" shape but reaches for XXH64
//! (wider, and `xxhash-rust`'s `Xxh64` already implements `Hasher`
//! directly) and adds the `BuildHasher` impl hash tables need.

use std::hash::{BuildHasher, Hasher};

pub use xxhash_rust::xxh32::Xxh32 as Xxh32State;

/// One-shot XXH32 hash, kept for callers that just want a checksum rather
/// than a `Hasher` (e.g. ziplist snapshot integrity checks).
#[inline]
pub fn xxh32_oneshot(data: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(data, seed)
}

/// [`BuildHasher`] for `HashMap<Rc<[u8]>, _, XxHash64Builder>`
/// `main`/`expires` tables). A fixed process-wide seed is enough here:
/// unlike a network-facing service, this engine has no adversarial-input
/// hash-flooding threat model to defend against.
#[derive(Debug, Clone, Copy)]
pub struct XxHash64Builder {
    seed: u64,
}

impl XxHash64Builder {
    pub fn new(seed: u64) -> Self {
        XxHash64Builder { seed }
    }
}

impl Default for XxHash64Builder {
    fn default() -> Self {
        XxHash64Builder { seed: 0 }
    }
}

impl BuildHasher for XxHash64Builder {
    type Hasher = xxhash_rust::xxh64::Xxh64;

    fn build_hasher(&self) -> Self::Hasher {
        xxhash_rust::xxh64::Xxh64::new(self.seed)
    }
}
