//! Error taxonomy for the keyspace engine.
//!
//! A plain `Debug + Clone + Copy + PartialEq + Eq` enum with a
//! hand-written `Display` impl, no `thiserror`. Kinds, not types.

use std::fmt;

/// Errors surfaced by database, string-op, and ziplist/value operations.
///
/// `Transient` (allocation failure) has no variant: under the global
/// allocator, exhaustion aborts the process before any partial mutation
/// is observable, so the "leaves pre-operation state" guarantee holds by
/// construction rather than by a caught error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyspaceError {
    /// Malformed cursor, bad offset, unknown flag combination, missing operand.
    InvalidArgument(&'static str),
    /// Operation applied to a key whose value is of incompatible type.
    WrongType,
    /// Numeric overflow, NaN/Inf on the float path, or a size cap exceeded.
    OutOfRange(&'static str),
    /// Key absent where presence was required (e.g. RENAME source).
    NotFound,
    /// Destination key already exists for an NX-style command.
    BusyKey,
    /// A broken invariant was detected (e.g. a key in `expires` without a
    /// matching key in `main`). Recoverable at the API boundary so tests can
    /// assert on it; call sites with a stronger precondition (e.g.
    /// `db::add`'s "key must be absent") still `assert!` directly rather
    /// than returning this variant, since violating them indicates a bug in
    /// this crate itself rather than caller-supplied bad input.
    Internal(&'static str),
}

impl fmt::Display for KeyspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyspaceError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            KeyspaceError::WrongType => write!(f, "wrong type for this operation"),
            KeyspaceError::OutOfRange(msg) => write!(f, "out of range: {msg}"),
            KeyspaceError::NotFound => write!(f, "no such key"),
            KeyspaceError::BusyKey => write!(f, "destination key already exists"),
            KeyspaceError::Internal(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for KeyspaceError {}

pub type Result<T> = std::result::Result<T, KeyspaceError>;
