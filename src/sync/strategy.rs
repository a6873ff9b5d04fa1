//! The synchronization strategy the engine is constructed with.

use std::ops::DerefMut;
use std::time::Duration;

use crate::core::SyncResult;

/// Outcome of a [`SyncStrategy::condvar_wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition variable was signaled.
    Signaled,
    /// The timeout elapsed without a signal.
    TimedOut,
}

impl WaitOutcome {
    /// `true` if the wait ended because the timeout elapsed.
    pub fn timed_out(self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

/// Convert an engine timeout in milliseconds into a wait bound.
///
/// A non-positive timeout means "wait indefinitely" and maps to `None`.
pub fn wait_timeout(timeout_ms: i64) -> Option<Duration> {
    u64::try_from(timeout_ms)
        .ok()
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}

/// Mutex and condition variable operations injected into the engine.
///
/// The mutex guards a value of type [`SyncStrategy::State`]: the engine's
/// internal state. Acquisition is scoped. [`SyncStrategy::lock`] returns a guard
/// that releases the mutex when dropped, on every exit path.
///
/// # Lifecycle
///
/// 1. `mutex_init` exactly once per handle (repeated calls are no-ops)
/// 2. `condvar_init` once, after `mutex_init`
/// 3. any number of `lock` / `condvar_wait` / `condvar_signal` / `unlock`
///
/// Locking before `mutex_init` or waiting before `condvar_init` is a
/// programmer error and panics.
///
/// # Reentrancy
///
/// The mutex is non-reentrant. Implementations should detect a second `lock`
/// from the owning thread and panic rather than deadlock.
pub trait SyncStrategy: Send + Sync + 'static {
    /// The state protected by the mutex.
    type State: Send;

    /// Scoped proof that the mutex is held.
    type Guard<'a>: DerefMut<Target = Self::State>
    where
        Self: 'a;

    /// Attach the mutex, taking ownership of the state it protects.
    fn mutex_init(&self, state: Self::State) -> SyncResult<()>;

    /// Attach the condition variable bound to the mutex.
    fn condvar_init(&self) -> SyncResult<()>;

    /// Acquire the mutex, blocking until it is free.
    fn lock(&self) -> Self::Guard<'_>;

    /// Release the mutex.
    fn unlock(&self, guard: Self::Guard<'_>) {
        drop(guard);
    }

    /// Release the mutex, wait for a signal or `timeout_ms`, reacquire.
    ///
    /// A non-positive `timeout_ms` waits indefinitely. The mutex is held again
    /// when this returns, whatever the outcome.
    fn condvar_wait(&self, guard: &mut Self::Guard<'_>, timeout_ms: i64) -> WaitOutcome;

    /// Wake at least one waiter. Requires the mutex to be held.
    fn condvar_signal(&self, guard: &Self::Guard<'_>);
}
