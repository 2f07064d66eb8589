use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock `mutex`, recovering the guard if a previous holder panicked.
///
/// The guarded state is only ever replaced wholesale, so a poisoned value is
/// still internally consistent.
pub(crate) fn lock_or_recover<'a, T>(
    mutex: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!(
            op,
            target_module = target,
            result = "poisoned_recovered",
            "Recovered from poisoned lock"
        );
        poisoned.into_inner()
    })
}
