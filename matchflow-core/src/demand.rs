// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Atomic demand bookkeeping with an explicit unbounded sentinel.
//!
//! Pull-protocol demand is tracked in an `AtomicU64`. A request of
//! [`UNBOUNDED`] switches the cell into unlimited mode: it is never
//! decremented again and every subsequent read observes the sentinel. The
//! sentinel is explicit rather than relying on overflow behavior; all
//! mutation goes through CAS loops so concurrent requesters and the single
//! producer can share the cell without locks.
//!
//! Orderings: successful CAS uses `AcqRel` so a requester's additions are
//! visible to the drainer that observes the new total, and loads use
//! `Acquire` to pair with them.

use core::sync::atomic::{AtomicU64, Ordering};

/// Sentinel for unlimited demand.
pub const UNBOUNDED: u64 = u64::MAX;

/// Adds `n` to the demand cell, saturating at [`UNBOUNDED`].
///
/// Returns the value observed before the addition.
pub fn add(cell: &AtomicU64, n: u64) -> u64 {
    let mut current = cell.load(Ordering::Acquire);
    loop {
        if current == UNBOUNDED {
            return UNBOUNDED;
        }
        let next = current.saturating_add(n);
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return current,
            Err(actual) => current = actual,
        }
    }
}

/// Subtracts `n` delivered items from the demand cell.
///
/// A cell holding [`UNBOUNDED`] is left untouched. Returns the value after
/// the subtraction, including any concurrent additions.
pub fn produced(cell: &AtomicU64, n: u64) -> u64 {
    let mut current = cell.load(Ordering::Acquire);
    loop {
        if current == UNBOUNDED {
            return UNBOUNDED;
        }
        let next = current.saturating_sub(n);
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

/// Consumes a single credit from the demand cell.
///
/// Returns `false` when the cell is empty. An unbounded cell always yields
/// a credit and is never decremented.
pub fn take_one(cell: &AtomicU64) -> bool {
    let mut current = cell.load(Ordering::Acquire);
    loop {
        if current == UNBOUNDED {
            return true;
        }
        if current == 0 {
            return false;
        }
        match cell.compare_exchange_weak(current, current - 1, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
}
