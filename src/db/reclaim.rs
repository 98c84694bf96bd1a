//! Background reclamation.
//!
//! The engine is single-threaded-cooperative over the keyspace itself, but
//! freeing a large value or an entire table off the hot path of the call
//! that unlinked it still needs somewhere to go. A genuine second OS
//! thread can't be that place: `Value`'s payload is `Rc`-shared (§4.3's
//! copy-on-write story), and `Rc`'s strong count is a plain, non-atomic
//! counter — handing a value to a thread that will drop it while another
//! handle of the *same* value is still being cloned or dropped on the
//! main thread (e.g. a shared small integer, §4.3) would race on that
//! counter. Paying for atomic refcounting everywhere just to cover the
//! rare delete-path handoff isn't worth it in an otherwise single-threaded
//! engine, so this keeps `crossbeam-channel`'s queue (teacher's
//! `threadpool.rs` handoff shape) as a same-thread deferral: `delete_lazy`
//! and `empty(async_flag)` push the value/table into the queue instead of
//! dropping it inline, and [`Reclaimer::drain`] — called opportunistically
//! by the host and always on `Drop` — is where the actual destructor runs.
//! What moves off the hot path is the *destructor cost*, not the *thread*.

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::table::Key;
use crate::value::Value;
use crate::xxhash::XxHash64Builder;

/// One unit of work handed off to the reclaimer: a single value, or an
/// entire table (from `empty(async_flag=true)`). Dropping the job is the
/// entire job — freeing memory is just running `T`'s destructor.
enum Job {
    Value(Value),
    Table(HashMap<Key, Value, XxHash64Builder>),
}

/// Handle to the reclaimer's deferred-drop queue.
///
/// Once a value is handed off, no path on the main executor may
/// dereference it again; moving it into the queue and never retaining a
/// handle on the caller's side is what enforces that at the type level.
/// Reclamation order within or between handed-off batches is unobservable
/// (§5) — [`Reclaimer::drain`] just drops jobs in queue order.
pub struct Reclaimer {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

impl Reclaimer {
    pub fn new() -> Self {
        let (tx, rx) = unbounded::<Job>();
        Reclaimer { tx, rx }
    }

    /// Hand a single value off for reclamation (`delete_lazy`).
    pub fn reclaim_value(&self, value: Value) {
        let _ = self.tx.send(Job::Value(value));
    }

    /// Hand an entire table off for reclamation (`empty(async_flag=true)`).
    pub fn reclaim_table(&self, table: HashMap<Key, Value, XxHash64Builder>) {
        let _ = self.tx.send(Job::Table(table));
    }

    /// Drop every job queued so far, actually freeing their memory.
    /// Returns the number of jobs drained. Safe to call from an idle point
    /// in the host's event loop; always called once more on `Drop` so nothing
    /// outlives the `Reclaimer` itself.
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while let Ok(job) = self.rx.try_recv() {
            drop(job);
            n += 1;
        }
        n
    }
}

impl Default for Reclaimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        self.drain();
    }
}
