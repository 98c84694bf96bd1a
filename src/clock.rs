//! Wall-clock milliseconds and the node-role capability.
//!
//! Expiration deadlines need wall-clock time — an absolute millisecond
//! timestamp that stays meaningful across a replication link — so this
//! module wraps `SystemTime` in a thin, total-ordering-preserving newtype
//! plus one free function to get "now".

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type MillisTimestamp = u64;

/// Current wall-clock time, in milliseconds since the Unix epoch.
pub fn now_ms() -> MillisTimestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the Unix epoch")
        .as_millis() as MillisTimestamp
}

/// Node-role capability consumed by `expire_if_needed`.
///
/// Passed explicitly by every caller rather than read off a thread-local
/// "current client", so that internal callers (e.g. a future eviction
/// sampler) can never accidentally inherit a client identity they don't
/// have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// This node owns physical deletion of expired keys.
    Primary,
    /// This node must not physically delete; it observes the primary's DEL.
    Replica { is_replication_link: bool },
    /// A snapshot/AOF replay is in progress; no key is ever "expired".
    Loading,
    /// A replica executing a script: "now" is frozen at script start so the
    /// expiration decision is consistent for the whole script.
    ScriptFrozenAt(MillisTimestamp),
}

impl Role {
    /// The timestamp this role should treat as "now" for expiration checks.
    pub fn effective_now(&self) -> MillisTimestamp {
        match self {
            Role::ScriptFrozenAt(ts) => *ts,
            _ => now_ms(),
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Role::Primary)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Role::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }

    #[test]
    fn script_frozen_role_ignores_wall_clock() {
        let role = Role::ScriptFrozenAt(12345);
        assert_eq!(role.effective_now(), 12345);
        assert!(!role.is_primary());
    }
}
