//! Tagged value object: type, encoding, refcount, access metadata, and the
//! encoding-dependent payload.
//!
//! `Value` follows the same "plain Rust enum as tagged union, no trait
//! objects" shape as [`crate::error::KeyspaceError`], generalized to carry
//! data per-variant, with the payload wrapped in `Rc` so that
//! `share`/`make_unique` are exactly `Rc::clone` / `Rc::make_mut`'s
//! copy-on-write semantics rather than a hand-rolled refcount.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::{Config, MaxMemoryPolicy};
use crate::dlist::DoublyLinkedList;
use crate::ziplist::Ziplist;

/// Logical datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    List,
    Set,
    Hash,
    ZSet,
    Module,
}

/// Physical representation. Only the encodings this
/// engine actually constructs are represented; `Module` values carry no
/// encoding of their own — opaque to the core, owned entirely by the
/// extension that registered the type.
#[derive(Debug, Clone)]
pub enum Encoding {
    /// String encodings.
    Int(i64),
    EmbStr(Rc<[u8]>),
    Raw(Vec<u8>),
    /// List encodings.
    ZiplistList(Ziplist),
    LinkedList(DoublyLinkedList<Ziplist>),
    /// Hash/zset encodings.
    ZiplistMap(Ziplist),
    HashTable(Vec<(Vec<u8>, Vec<u8>)>),
    /// Placeholder for an externally-defined module type; the core does
    /// not interpret module payloads.
    Opaque,
}

/// 24 bits of LRU seconds, or 24 bits access-minutes + 8-bit LFU counter,
/// selected by [`Config::maxmemory_policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMeta {
    Lru { clock_seconds: u32 },
    Lfu { access_minutes: u32, counter: u8 },
    Disabled,
}

impl AccessMeta {
    pub fn initial(policy: MaxMemoryPolicy, now_ms: u64) -> Self {
        match policy {
            MaxMemoryPolicy::Lru => AccessMeta::Lru {
                clock_seconds: (now_ms / 1000) as u32,
            },
            MaxMemoryPolicy::Lfu => AccessMeta::Lfu {
                access_minutes: (now_ms / 60_000) as u32,
                counter: LFU_INIT_VAL,
            },
            MaxMemoryPolicy::NoEviction => AccessMeta::Disabled,
        }
    }
}

/// Starting LFU counter for a freshly created value (mirrors the "5" used
/// by real LFU eviction implementations so a brand new key isn't an
/// instant eviction target).
const LFU_INIT_VAL: u8 = 5;

/// Minutes between each LFU decay step.
const LFU_DECAY_PERIOD_MINUTES: u32 = 1;

/// `factor` in the logarithmic LFU increment probability.
const LFU_LOG_FACTOR: f64 = 10.0;

/// The part of a `Value` that is actually shared between handles: the
/// payload plus its access metadata. `refcount` is just
/// `Rc::strong_count` on this.
#[derive(Debug)]
struct Inner {
    encoding: Encoding,
    access_meta: Cell<AccessMeta>,
}

/// A value object: type tag plus a reference-counted, copy-on-write payload.
#[derive(Debug, Clone)]
pub struct Value {
    value_type: ValueType,
    inner: Rc<Inner>,
}

impl Value {
    pub fn new(value_type: ValueType, encoding: Encoding, access_meta: AccessMeta) -> Self {
        Value {
            value_type,
            inner: Rc::new(Inner {
                encoding,
                access_meta: Cell::new(access_meta),
            }),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn encoding(&self) -> &Encoding {
        &self.inner.encoding
    }

    pub fn access_meta(&self) -> AccessMeta {
        self.inner.access_meta.get()
    }

    /// Current share count.
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// A new handle to the same underlying payload, bumping the refcount.
    pub fn share(&self) -> Value {
        Value {
            value_type: self.value_type,
            inner: Rc::clone(&self.inner),
        }
    }

    /// `make_unique`: if shared (refcount>1) or not a plain
    /// raw-encoded buffer, replace the payload with a deep-copied,
    /// refcount-1, `Raw`-encoded clone, ready for in-place mutation.
    /// A no-op when already unique and raw.
    pub fn make_unique(&mut self) {
        let needs_copy = self.refcount() > 1 || !matches!(self.inner.encoding, Encoding::Raw(_));
        if !needs_copy {
            return;
        }
        let raw = as_bytes_for_unsharing(&self.inner.encoding);
        self.inner = Rc::new(Inner {
            encoding: Encoding::Raw(raw),
            access_meta: Cell::new(self.inner.access_meta.get()),
        });
    }

    /// Mutable access to the payload. Callers must call
    /// [`Value::make_unique`] first if the mutation needs exclusive
    /// ownership — this only succeeds when already unique.
    pub fn encoding_mut(&mut self) -> Option<&mut Encoding> {
        Rc::get_mut(&mut self.inner).map(|inner| &mut inner.encoding)
    }

    /// Apply the access-metadata update rule on a read. Skipped
    /// entirely by callers passing `NO_TOUCH` or during a snapshot child
    /// (those callers simply don't call this).
    pub fn touch(&self, policy: MaxMemoryPolicy, now_ms: u64) {
        match policy {
            MaxMemoryPolicy::NoEviction => {}
            MaxMemoryPolicy::Lru => {
                self.inner.access_meta.set(AccessMeta::Lru {
                    clock_seconds: (now_ms / 1000) as u32,
                });
            }
            MaxMemoryPolicy::Lfu => {
                let (access_minutes, counter) = match self.inner.access_meta.get() {
                    AccessMeta::Lfu {
                        access_minutes,
                        counter,
                    } => (access_minutes, counter),
                    _ => (0, LFU_INIT_VAL),
                };
                let now_minutes = (now_ms / 60_000) as u32;
                let elapsed = now_minutes.saturating_sub(access_minutes);
                let decayed = counter.saturating_sub((elapsed / LFU_DECAY_PERIOD_MINUTES) as u8);
                let incremented = lfu_probabilistic_increment(decayed, lfu_sample());
                self.inner.access_meta.set(AccessMeta::Lfu {
                    access_minutes: now_minutes,
                    counter: incremented,
                });
            }
        }
    }
}

fn as_bytes_for_unsharing(encoding: &Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Int(v) => v.to_string().into_bytes(),
        Encoding::EmbStr(s) => s.to_vec(),
        Encoding::Raw(b) => b.clone(),
        _ => Vec::new(),
    }
}

/// One sample in `[0, 1)` used by the probabilistic LFU increment. Callers
/// needing determinism for tests go through [`lfu_probabilistic_increment`]
/// directly instead of `touch`.
fn lfu_sample() -> f64 {
    // A process-wide xorshift-derived sample is enough here: LFU only
    // needs *a* source of randomness, not a cryptographic one, and the
    // engine has no other PRNG dependency to reuse.
    thread_local! {
        static STATE: Cell<u64> = Cell::new(0x2545F4914F6CDD1D);
    }
    STATE.with(|s| {
        let mut x = s.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        s.set(x);
        (x >> 11) as f64 / (1u64 << 53) as f64
    })
}

/// Probabilistically increment an LFU counter following the logarithmic
/// curve `p = 1/((counter-base)*factor+1)`. `sample` is a draw
/// from `[0, 1)`; exposed as a parameter so tests can pin the outcome.
pub fn lfu_probabilistic_increment(counter: u8, sample: f64) -> u8 {
    if counter >= u8::MAX {
        return counter;
    }
    const LFU_INIT_VAL_F: f64 = LFU_INIT_VAL as f64;
    let base = (counter as f64 - LFU_INIT_VAL_F).max(0.0);
    let p = 1.0 / (base * LFU_LOG_FACTOR + 1.0);
    if sample < p {
        counter + 1
    } else {
        counter
    }
}

/// Process-wide shared small-integer pool: the first
/// `small_integer_shared_max` nonnegative integers are immortal singleton
/// `Value`s. Callers that would otherwise allocate a fresh `Int`-encoded
/// value for a nonnegative integer in range get a shared handle instead,
/// on the promise they will not mutate it in place (any in-place mutation
/// goes through [`Value::make_unique`] first, which always copies a shared
/// value regardless of its numeric encoding).
pub struct SharedIntPool {
    values: Vec<Value>,
}

impl SharedIntPool {
    pub fn new(config: &Config) -> Self {
        let max = config.small_integer_shared_max.max(0) as usize;
        let values = (0..max)
            .map(|i| Value::new(ValueType::String, Encoding::Int(i as i64), AccessMeta::Disabled))
            .collect();
        SharedIntPool { values }
    }

    /// A shared handle to `v`'s singleton `Value` if it's in range, else `None`.
    pub fn get(&self, v: i64) -> Option<Value> {
        let idx = usize::try_from(v).ok()?;
        self.values.get(idx).map(Value::share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn share_bumps_refcount_and_make_unique_copies() {
        let v = Value::new(
            ValueType::String,
            Encoding::Raw(b"hello".to_vec()),
            AccessMeta::Disabled,
        );
        assert_eq!(v.refcount(), 1);
        let mut shared = v.share();
        assert_eq!(v.refcount(), 2);
        assert_eq!(shared.refcount(), 2);

        shared.make_unique();
        assert_eq!(shared.refcount(), 1);
        // original `v` still has the other handle.
        assert_eq!(v.refcount(), 1);
        match shared.encoding() {
            Encoding::Raw(b) => assert_eq!(b, b"hello"),
            _ => panic!("expected raw encoding after make_unique"),
        }
    }

    #[test]
    fn make_unique_is_a_no_op_for_an_already_unique_raw_value() {
        let mut v = Value::new(
            ValueType::String,
            Encoding::Raw(b"x".to_vec()),
            AccessMeta::Disabled,
        );
        v.make_unique();
        assert_eq!(v.refcount(), 1);
        assert!(v.encoding_mut().is_some());
    }

    #[test]
    fn make_unique_converts_non_raw_encodings_to_raw() {
        let mut v = Value::new(ValueType::String, Encoding::Int(42), AccessMeta::Disabled);
        v.make_unique();
        match v.encoding() {
            Encoding::Raw(b) => assert_eq!(b, b"42"),
            _ => panic!("expected raw encoding"),
        }
    }

    #[test]
    fn shared_int_pool_returns_singletons_in_range_and_none_outside() {
        let config = Config::default();
        let pool = SharedIntPool::new(&config);
        let a = pool.get(5).unwrap();
        let b = pool.get(5).unwrap();
        assert_eq!(a.refcount(), b.refcount());
        assert!(a.refcount() >= 3); // pool's own handle + a + b
        assert!(pool.get(-1).is_none());
        assert!(pool.get(config.small_integer_shared_max).is_none());
    }

    #[test]
    fn lfu_increment_is_probability_one_at_the_init_value() {
        // base = counter - LFU_INIT_VAL = 0, so p = 1: always increments.
        assert_eq!(lfu_probabilistic_increment(LFU_INIT_VAL, 0.0), LFU_INIT_VAL + 1);
        assert_eq!(lfu_probabilistic_increment(LFU_INIT_VAL, 0.999), LFU_INIT_VAL + 1);
    }

    #[test]
    fn lfu_increment_saturates_at_u8_max() {
        assert_eq!(lfu_probabilistic_increment(u8::MAX, 0.0), u8::MAX);
    }

    #[test]
    fn touch_lru_updates_clock_from_wall_time() {
        let v = Value::new(
            ValueType::String,
            Encoding::Raw(b"x".to_vec()),
            AccessMeta::Lru { clock_seconds: 0 },
        );
        v.touch(MaxMemoryPolicy::Lru, 5_000);
        assert_eq!(v.access_meta(), AccessMeta::Lru { clock_seconds: 5 });
    }

    #[test]
    fn touch_is_a_no_op_under_no_eviction_policy() {
        let v = Value::new(ValueType::String, Encoding::Raw(b"x".to_vec()), AccessMeta::Disabled);
        v.touch(MaxMemoryPolicy::NoEviction, 99_999);
        assert_eq!(v.access_meta(), AccessMeta::Disabled);
    }
}
