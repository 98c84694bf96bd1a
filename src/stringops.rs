//! String-value commands: SET/GET family, SETRANGE/GETRANGE,
//! APPEND, the INCR family, and the vectorized MGET/MSET/MSETNX.
//!
//! Every write-path function here ends by calling [`fire_write_hooks`] in
//! the mandated order — signal the watch, notify keyspace subscribers,
//! propagate, bump the dirty counter —
//! and every function that type-checks an existing value does so before
//! touching anything, so a `WrongType` error never leaves a partial
//! mutation behind.

use std::rc::Rc;

use crate::clock::Role;
use crate::config::Config;
use crate::db::table::Database;
use crate::db::{self, Stats};
use crate::error::{KeyspaceError, Result};
use crate::hooks::{EventCategory, KeyspaceHooks};
use crate::value::{AccessMeta, Encoding, SharedIntPool, Value, ValueType};

/// Conditional-write flag for [`set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    None,
    /// Fail (return `Ok(false)`) if the key is already present.
    Nx,
    /// Fail (return `Ok(false)`) if the key is absent.
    Xx,
}

/// Above this length a fresh string value is heap-`Raw` rather than the
/// inline-`EmbStr` representation, matching the well-known embedded-string
/// threshold real keyspace engines of this shape use. The spec names the
/// *existence* of an inline short-string encoding (§3) but not this exact
/// number, so it's pinned here rather than left to drift between call
/// sites — see DESIGN.md.
const EMBSTR_MAX_LEN: usize = 44;

/// Choose the narrowest encoding for a fresh string value: a shared
/// singleton or freshly allocated `Int` for a canonical in-range integer,
/// `EmbStr` for a short buffer, `Raw` otherwise.
fn make_string_value(bytes: &[u8], config: &Config, shared: &SharedIntPool, role: Role) -> Value {
    let access_meta = AccessMeta::initial(config.maxmemory_policy, role.effective_now());
    if let Some(v) = crate::ziplist::entry::try_parse_int(bytes) {
        if let Some(shared_val) = shared.get(v) {
            return shared_val;
        }
        return Value::new(ValueType::String, Encoding::Int(v), access_meta);
    }
    if bytes.len() <= EMBSTR_MAX_LEN {
        Value::new(ValueType::String, Encoding::EmbStr(Rc::from(bytes)), access_meta)
    } else {
        Value::new(ValueType::String, Encoding::Raw(bytes.to_vec()), access_meta)
    }
}

/// Read out a string value's bytes regardless of its encoding. Callers
/// must already know `v.value_type() == ValueType::String`.
fn string_bytes(v: &Value) -> Vec<u8> {
    match v.encoding() {
        Encoding::Int(n) => n.to_string().into_bytes(),
        Encoding::EmbStr(s) => s.to_vec(),
        Encoding::Raw(b) => b.clone(),
        _ => unreachable!("string_bytes called on a non-string encoding"),
    }
}

/// Type-check helper: `WrongType` if `key` exists and isn't a string.
fn check_string_type(db: &Database, key: &[u8]) -> Result<Option<Vec<u8>>> {
    match db.main.get(key) {
        None => Ok(None),
        Some(v) if v.value_type() == ValueType::String => Ok(Some(string_bytes(v))),
        Some(_) => Err(KeyspaceError::WrongType),
    }
}

/// Fire the three write-path hooks in the mandated order and bump the
/// dirty counter.
fn fire_write_hooks(
    db_id: usize,
    key: &[u8],
    argv: &[Vec<u8>],
    category: EventCategory,
    event: &str,
    hooks: &dyn KeyspaceHooks,
    stats: &mut Stats,
) {
    hooks.signal_modified_key(db_id, key);
    hooks.notify_keyspace_event(category, event, key, db_id);
    hooks.propagate(db_id, argv);
    stats.dirty += 1;
}

fn store(db: &mut Database, key: &[u8], value: Value, existed: bool) {
    if existed {
        db::overwrite(db, key, value);
    } else {
        db::add(db, key, value);
    }
}

/// `SET key val [NX|XX] [ttl]`. On success, installs `ttl` (if
/// given) after `Database::set`, which already clears any prior TTL.
/// Returns `Ok(false)` without mutating anything if the NX/XX condition
/// fails.
#[allow(clippy::too_many_arguments)]
pub fn set(
    db: &mut Database,
    key: &[u8],
    val: &[u8],
    condition: SetCondition,
    ttl: Option<u64>,
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<bool> {
    if val.len() > config.max_string_size {
        return Err(KeyspaceError::OutOfRange("value exceeds max_string_size"));
    }
    let existed = db::lookup_write(db, key, role, hooks, config, stats).is_some();
    match condition {
        SetCondition::Nx if existed => return Ok(false),
        SetCondition::Xx if !existed => return Ok(false),
        _ => {}
    }
    let value = make_string_value(val, config, shared, role);
    db::set(db, key, value);
    if let Some(deadline) = ttl {
        db::set_expire(db, key, deadline);
    }
    fire_write_hooks(
        db.id(),
        key,
        &[b"SET".to_vec(), key.to_vec(), val.to_vec()],
        EventCategory::String,
        "set",
        hooks,
        stats,
    );
    Ok(true)
}

/// `GET key` — thin wrapper over [`db::lookup_read`] that also enforces
/// the string type check.
pub fn get(
    db: &mut Database,
    key: &[u8],
    flags: db::LookupFlags,
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    stats: &mut Stats,
) -> Result<Option<Vec<u8>>> {
    match db::lookup_read(db, key, flags, role, hooks, config, stats) {
        None => Ok(None),
        Some(v) if v.value_type() == ValueType::String => Ok(Some(string_bytes(v))),
        Some(_) => Err(KeyspaceError::WrongType),
    }
}

/// `SETRANGE key offset bytes`: grows the stored string with
/// zero-fill up to `offset+len(bytes)`, then writes `bytes` there. Returns
/// the final length.
#[allow(clippy::too_many_arguments)]
pub fn setrange(
    db: &mut Database,
    key: &[u8],
    offset: i64,
    bytes: &[u8],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<usize> {
    if offset < 0 {
        return Err(KeyspaceError::InvalidArgument("offset is out of range"));
    }
    let offset = offset as usize;
    db::expire_if_needed(db, key, role, hooks, config, stats);
    let existing = check_string_type(db, key)?;
    let existed = existing.is_some();
    let mut buf = existing.unwrap_or_default();

    if bytes.is_empty() {
        return Ok(buf.len());
    }
    let final_len = offset + bytes.len();
    if final_len > config.max_string_size {
        return Err(KeyspaceError::OutOfRange("resulting string exceeds max_string_size"));
    }
    if buf.len() < final_len {
        buf.resize(final_len, 0);
    }
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);

    let value = make_string_value(&buf, config, shared, role);
    store(db, key, value, existed);
    fire_write_hooks(
        db.id(),
        key,
        &[b"SETRANGE".to_vec(), key.to_vec(), offset.to_string().into_bytes(), bytes.to_vec()],
        EventCategory::String,
        "setrange",
        hooks,
        stats,
    );
    Ok(buf.len())
}

/// `GETRANGE key start end`: inclusive byte slice, negative
/// indices count from the end, clamped to bounds, empty on an inverted
/// range.
pub fn getrange(
    db: &mut Database,
    key: &[u8],
    start: i64,
    end: i64,
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    stats: &mut Stats,
) -> Result<Vec<u8>> {
    let flags = db::LookupFlags::default();
    let bytes = match db::lookup_read(db, key, flags, role, hooks, config, stats) {
        None => return Ok(Vec::new()),
        Some(v) if v.value_type() == ValueType::String => string_bytes(v),
        Some(_) => return Err(KeyspaceError::WrongType),
    };
    let len = bytes.len() as i64;
    if len == 0 {
        return Ok(Vec::new());
    }
    let resolve = |i: i64| -> i64 { if i < 0 { (len + i).max(0) } else { i } };
    let start = resolve(start).min(len - 1).max(0);
    let end = resolve(end).min(len - 1);
    if end < start {
        return Ok(Vec::new());
    }
    Ok(bytes[start as usize..=end as usize].to_vec())
}

/// `INCRBY key delta`: parses the existing value as a
/// canonical integer, rejects overflow, writes back. Reuses the existing
/// object's storage only conceptually — `store` already routes through
/// `overwrite` when the key exists, preserving any TTL
/// `overwrite`), and `make_string_value` hands back the shared singleton
/// when the result lands back in the shared-integer range.
#[allow(clippy::too_many_arguments)]
pub fn incr_by(
    db: &mut Database,
    key: &[u8],
    delta: i64,
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<i64> {
    db::expire_if_needed(db, key, role, hooks, config, stats);
    let existing = check_string_type(db, key)?;
    let existed = existing.is_some();
    let current = match &existing {
        None => 0,
        Some(bytes) => crate::ziplist::entry::try_parse_int(bytes)
            .ok_or(KeyspaceError::InvalidArgument("value is not an integer"))?,
    };
    let new_value = current
        .checked_add(delta)
        .ok_or(KeyspaceError::OutOfRange("increment or decrement would overflow"))?;

    let value = make_string_value(new_value.to_string().as_bytes(), config, shared, role);
    store(db, key, value, existed);
    fire_write_hooks(
        db.id(),
        key,
        &[b"SET".to_vec(), key.to_vec(), new_value.to_string().into_bytes()],
        EventCategory::String,
        "incrby",
        hooks,
        stats,
    );
    Ok(new_value)
}

/// `INCRBYFLOAT key delta`: parses as `f64`, rejects NaN/Inf
/// on input or output, formats without scientific notation or a trailing
/// `.0`.
#[allow(clippy::too_many_arguments)]
pub fn incr_by_float(
    db: &mut Database,
    key: &[u8],
    delta: f64,
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<f64> {
    if !delta.is_finite() {
        return Err(KeyspaceError::OutOfRange("increment is not a finite number"));
    }
    db::expire_if_needed(db, key, role, hooks, config, stats);
    let existing = check_string_type(db, key)?;
    let existed = existing.is_some();
    let current = match &existing {
        None => 0.0,
        Some(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or(KeyspaceError::InvalidArgument("value is not a float"))?,
    };
    let new_value = current + delta;
    if !new_value.is_finite() {
        return Err(KeyspaceError::OutOfRange("increment would produce NaN or Infinity"));
    }

    let formatted = format_f64(new_value);
    let value = make_string_value(formatted.as_bytes(), config, shared, role);
    store(db, key, value, existed);
    fire_write_hooks(
        db.id(),
        key,
        &[b"SET".to_vec(), key.to_vec(), formatted.clone().into_bytes()],
        EventCategory::String,
        "incrbyfloat",
        hooks,
        stats,
    );
    Ok(new_value)
}

/// Format an `f64` the way INCRBYFLOAT-style commands do: fixed-point, no
/// scientific notation, trailing zeros (and a bare trailing `.`) trimmed.
fn format_f64(v: f64) -> String {
    let mut s = format!("{v:.17}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// `APPEND key bytes`: creates if absent; otherwise unshares
/// (via [`Value::make_unique`]) and concatenates in place. Enforces the
/// size cap before committing.
#[allow(clippy::too_many_arguments)]
pub fn append(
    db: &mut Database,
    key: &[u8],
    bytes: &[u8],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<usize> {
    db::expire_if_needed(db, key, role, hooks, config, stats);
    let existing = check_string_type(db, key)?;
    let existed = existing.is_some();
    let mut buf = existing.unwrap_or_default();
    if buf.len() + bytes.len() > config.max_string_size {
        return Err(KeyspaceError::OutOfRange("resulting string exceeds max_string_size"));
    }
    buf.extend_from_slice(bytes);

    let value = make_string_value(&buf, config, shared, role);
    store(db, key, value, existed);
    fire_write_hooks(
        db.id(),
        key,
        &[b"APPEND".to_vec(), key.to_vec(), bytes.to_vec()],
        EventCategory::String,
        "append",
        hooks,
        stats,
    );
    Ok(buf.len())
}

/// `MGET key...`: vectorized read. A key of the wrong type or
/// that's absent both surface as `None` — MGET never errors on type
/// mismatch, the same "well-known absent reply" the spec names for
/// read-path `NotFound`.
pub fn mget(
    db: &mut Database,
    keys: &[&[u8]],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    stats: &mut Stats,
) -> Vec<Option<Vec<u8>>> {
    let flags = db::LookupFlags::default();
    keys.iter()
        .map(|key| match db::lookup_read(db, key, flags, role, hooks, config, stats) {
            Some(v) if v.value_type() == ValueType::String => Some(string_bytes(v)),
            _ => None,
        })
        .collect()
}

/// `MSET key val key val...`: unconditional, vectorized
/// `SET`. Each pair fires its own write-path hooks in turn.
pub fn mset(
    db: &mut Database,
    pairs: &[(&[u8], &[u8])],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<()> {
    for (k, v) in pairs {
        set(db, k, v, SetCondition::None, None, role, hooks, config, shared, stats)?;
    }
    Ok(())
}

/// `MSETNX key val...`: all-or-nothing — checks presence of
/// every destination before writing any. Returns `false` (no mutation at
/// all) if any destination already exists.
pub fn msetnx(
    db: &mut Database,
    pairs: &[(&[u8], &[u8])],
    role: Role,
    hooks: &dyn KeyspaceHooks,
    config: &Config,
    shared: &SharedIntPool,
    stats: &mut Stats,
) -> Result<bool> {
    for (k, _) in pairs {
        if db::lookup_write(db, k, role, hooks, config, stats).is_some() {
            return Ok(false);
        }
    }
    mset(db, pairs, role, hooks, config, shared, stats)?;
    Ok(true)
}
