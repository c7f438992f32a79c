//! Podium execution layer.
//!
//! This crate owns all mutable tournament state: [`TournamentStore`] holds tournament records
//! and enforces the lifecycle state machine, [`ScoreLedger`] holds per-participant best scores.
//! Nothing here emits events or touches I/O; the node wires both into a service.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution. Every time-dependent call takes `now_ms`.
//! - Avoid iteration order of hash-based collections influencing outputs (rankings are sorted,
//!   id lists are sorted before they are returned).
//!
//! ## Locking
//! Each tournament sits behind its own `RwLock`; the registry lock is held only long enough to
//! clone the tournament's `Arc`. Joins and transitions take the tournament's write lock. Score
//! submissions take its read lock, so participants in the same tournament submit concurrently
//! and serialize only on their own ledger slot. Locks are always acquired tournament first,
//! ledger second.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod ledger;
pub mod store;

pub use ledger::ScoreLedger;
pub use store::{Created, StoreSettings, TournamentStore};


// Every mutation under these locks is a single assignment or insert, so a poisoned guard still
// holds a consistent value.

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
