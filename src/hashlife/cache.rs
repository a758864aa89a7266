//! Process-wide store of the most recently used [`Universe`].
//!
//! A step checks the universe out, works on it without holding the lock and
//! checks it back in afterwards. Concurrent steps simply build their own
//! universe when the slot is empty, and clearing bumps an epoch so that
//! universes checked out before the clear are dropped instead of returned.

use super::universe::Universe;
use crate::Rule;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct SharedUniverse {
    epoch: u64,
    universe: Option<Universe>,
}

static SHARED: Mutex<SharedUniverse> = Mutex::new(SharedUniverse {
    epoch: 0,
    universe: None,
});

fn lock() -> MutexGuard<'static, SharedUniverse> {
    // the slot holds memoized data only, so a panic elsewhere cannot corrupt it
    SHARED.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Takes the cached universe, or creates an empty one, ready to simulate `rule`.
/// Returns the epoch to pass back to [`checkin`].
pub(super) fn checkout(rule: Rule) -> (Universe, u64) {
    let (cached, epoch) = {
        let mut shared = lock();
        (shared.universe.take(), shared.epoch)
    };
    let universe = match cached {
        Some(mut universe) => {
            universe.set_rule(rule);
            universe
        }
        None => {
            log::debug!("Creating a new node cache for {}", rule);
            Universe::new(rule)
        }
    };
    (universe, epoch)
}

/// Returns a universe to the slot unless it grew beyond `mem_limit_bytes`,
/// the cache was cleared since [`checkout`], or another step already filled it.
pub(super) fn checkin(universe: Universe, epoch: u64, mem_limit_bytes: usize) {
    let bytes = universe.bytes_total();
    if bytes > mem_limit_bytes {
        log::debug!(
            "Dropping node cache of {} bytes, the limit is {} bytes",
            bytes,
            mem_limit_bytes
        );
        return;
    }
    let mut shared = lock();
    if shared.epoch != epoch {
        log::trace!("Node cache was cleared during the step, dropping it");
    } else if shared.universe.is_none() {
        shared.universe = Some(universe);
        return;
    }
    // drop the rejected universe outside of the lock
    drop(shared);
}

pub(super) fn clear() {
    let dropped = {
        let mut shared = lock();
        shared.epoch += 1;
        shared.universe.take()
    };
    if let Some(universe) = dropped {
        log::debug!("Cleared node cache of {} bytes", universe.bytes_total());
    }
}

pub(super) fn bytes_total() -> usize {
    lock().universe.as_ref().map_or(0, Universe::bytes_total)
}

/// Rule of the cached universe, if any.
#[cfg(test)]
pub(super) fn cached_rule() -> Option<Rule> {
    lock().universe.as_ref().map(Universe::rule)
}
