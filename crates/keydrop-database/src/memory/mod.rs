//! In-memory store implementations for single-process runs and tests.
//!
//! State lives behind `std::sync::Mutex` guards that are never held across
//! an `.await`, so claim transactions can release their locks from `Drop`.

pub mod record;
pub mod settings;
pub mod view_pointer;

pub use record::{MemoryClaimTransaction, MemoryRecordStore};
pub use settings::MemorySettingsStore;
pub use view_pointer::MemoryViewPointerStore;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
