//! Poisoned-lock recovery for the engine's shared configuration slots.
//! A caller-registered handler that panics mid-conversion poisons whichever
//! slot the call was holding. The stored value is still a complete
//! configuration, so the engine logs which surface was affected and keeps
//! serving instead of propagating the panic into every later call.

use std::sync::{LockResult, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<Guard>(result: LockResult<Guard>, surface: &'static str) -> Guard {
    result.unwrap_or_else(|poisoned| {
        warn!(
            surface,
            "Engine lock poisoned by a panicked handler; reusing the stored configuration"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn rw_read<'a, T>(lock: &'a RwLock<T>, surface: &'static str) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), surface)
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    surface: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), surface)
}

pub(crate) fn mutex_lock<'a, T>(lock: &'a Mutex<T>, surface: &'static str) -> MutexGuard<'a, T> {
    recover(lock.lock(), surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn poisoned_slot_still_yields_the_stored_configuration() {
        let slot = Arc::new(RwLock::new(Some("installed handler".to_owned())));
        let poisoner = Arc::clone(&slot);
        let _ = thread::spawn(move || {
            let _guard = poisoner.write().expect("first write locks");
            panic!("handler panicked mid-conversion");
        })
        .join();
        assert!(slot.is_poisoned());

        assert_eq!(
            rw_read(&slot, "diagnostic handlers").as_deref(),
            Some("installed handler")
        );
        *rw_write(&slot, "diagnostic handlers") = None;
        assert_eq!(*rw_read(&slot, "diagnostic handlers"), None);
    }

    #[test]
    fn poisoned_stack_keeps_its_entries() {
        let entries = Arc::new(Mutex::new(vec!["oldest".to_owned()]));
        let poisoner = Arc::clone(&entries);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().expect("first lock");
            panic!("boom");
        })
        .join();
        assert!(entries.is_poisoned());

        assert_eq!(mutex_lock(&entries, "error stack").len(), 1);
    }
}
