//! Native-thread synchronization strategy backed by `parking_lot`.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use super::strategy::{SyncStrategy, WaitOutcome, wait_timeout};
use crate::core::{SyncError, SyncResult};

/// Mutex and condition variable for engines driven by OS threads.
///
/// Both primitives are attached lazily through [`SyncStrategy::mutex_init`] and
/// [`SyncStrategy::condvar_init`]. The owning thread is tracked so that a
/// re-entrant `lock` panics instead of deadlocking.
pub struct ThreadSync<T> {
    mutex: OnceLock<Mutex<T>>,
    condvar: OnceLock<Condvar>,
    /// Thread currently holding `mutex`, if any.
    owner: Mutex<Option<ThreadId>>,
}

impl<T> ThreadSync<T> {
    /// Create a strategy with nothing attached yet.
    pub fn new() -> Self {
        Self {
            mutex: OnceLock::new(),
            condvar: OnceLock::new(),
            owner: Mutex::new(None),
        }
    }

    /// Check if the mutex has been attached.
    pub fn is_mutex_initialized(&self) -> bool {
        self.mutex.get().is_some()
    }

    /// Check if the condition variable has been attached.
    pub fn is_condvar_initialized(&self) -> bool {
        self.condvar.get().is_some()
    }

    fn attached_mutex(&self) -> &Mutex<T> {
        let Some(mutex) = self.mutex.get() else {
            panic!("DCL2 engine mutex used before mutex_init");
        };
        mutex
    }

    fn attached_condvar(&self) -> &Condvar {
        let Some(condvar) = self.condvar.get() else {
            panic!("DCL2 engine condvar used before condvar_init");
        };
        condvar
    }
}

impl<T> Default for ThreadSync<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ThreadSync<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadSync")
            .field("mutex_initialized", &self.is_mutex_initialized())
            .field("condvar_initialized", &self.is_condvar_initialized())
            .field("owner", &*self.owner.lock())
            .finish()
    }
}

/// Guard returned by [`ThreadSync`]. Dropping it releases the mutex.
pub struct ThreadSyncGuard<'a, T> {
    inner: MutexGuard<'a, T>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl<T> Deref for ThreadSyncGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for ThreadSyncGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T> Drop for ThreadSyncGuard<'_, T> {
    fn drop(&mut self) {
        // Runs before `inner` releases the mutex.
        *self.owner.lock() = None;
    }
}

impl<T: Send + 'static> SyncStrategy for ThreadSync<T> {
    type State = T;
    type Guard<'a> = ThreadSyncGuard<'a, T>;

    fn mutex_init(&self, state: T) -> SyncResult<()> {
        if self.mutex.set(Mutex::new(state)).is_err() {
            debug!("engine mutex already initialized, ignoring repeated mutex_init");
        }
        Ok(())
    }

    fn condvar_init(&self) -> SyncResult<()> {
        if !self.is_mutex_initialized() {
            return Err(SyncError::MutexNotInitialized);
        }
        if self.condvar.set(Condvar::new()).is_err() {
            debug!("engine condvar already initialized, ignoring repeated condvar_init");
        }
        Ok(())
    }

    fn lock(&self) -> ThreadSyncGuard<'_, T> {
        let mutex = self.attached_mutex();
        let me = thread::current().id();
        if *self.owner.lock() == Some(me) {
            panic!("re-entrant lock of DCL2 engine mutex from {me:?}");
        }

        let inner = mutex.lock();
        *self.owner.lock() = Some(me);
        ThreadSyncGuard {
            inner,
            owner: &self.owner,
        }
    }

    fn condvar_wait(&self, guard: &mut ThreadSyncGuard<'_, T>, timeout_ms: i64) -> WaitOutcome {
        let condvar = self.attached_condvar();

        *self.owner.lock() = None;
        let outcome = match wait_timeout(timeout_ms) {
            Some(timeout) => {
                if condvar.wait_for(&mut guard.inner, timeout).timed_out() {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Signaled
                }
            }
            None => {
                condvar.wait(&mut guard.inner);
                WaitOutcome::Signaled
            }
        };
        *self.owner.lock() = Some(thread::current().id());

        outcome
    }

    fn condvar_signal(&self, _guard: &ThreadSyncGuard<'_, T>) {
        self.attached_condvar().notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn initialized<T: Send + 'static>(state: T) -> Arc<ThreadSync<T>> {
        let sync = Arc::new(ThreadSync::new());
        sync.mutex_init(state).unwrap();
        sync.condvar_init().unwrap();
        sync
    }

    fn is_held<T>(sync: &ThreadSync<T>) -> bool {
        sync.mutex.get().unwrap().try_lock().is_none()
    }

    #[test]
    fn test_lazy_init() {
        let sync = ThreadSync::new();
        assert!(!sync.is_mutex_initialized());
        assert!(!sync.is_condvar_initialized());

        sync.mutex_init(0u32).unwrap();
        assert!(sync.is_mutex_initialized());
        assert!(!sync.is_condvar_initialized());

        sync.condvar_init().unwrap();
        assert!(sync.is_condvar_initialized());
    }

    #[test]
    fn test_condvar_before_mutex() {
        let sync: ThreadSync<u32> = ThreadSync::new();
        assert_eq!(sync.condvar_init(), Err(SyncError::MutexNotInitialized));
    }

    #[test]
    fn test_mutex_init_idempotent() {
        let sync = ThreadSync::new();
        sync.mutex_init(1u32).unwrap();
        sync.mutex_init(2u32).unwrap();
        sync.condvar_init().unwrap();
        sync.condvar_init().unwrap();

        assert_eq!(*sync.lock(), 1);
    }

    #[test]
    #[should_panic(expected = "before mutex_init")]
    fn test_lock_before_init_panics() {
        let sync: ThreadSync<u32> = ThreadSync::new();
        let _guard = sync.lock();
    }

    #[test]
    #[should_panic(expected = "before condvar_init")]
    fn test_wait_before_condvar_init_panics() {
        let sync = ThreadSync::new();
        sync.mutex_init(0u32).unwrap();
        let mut guard = sync.lock();
        sync.condvar_wait(&mut guard, 10);
    }

    #[test]
    #[should_panic(expected = "re-entrant")]
    fn test_reentrant_lock_panics() {
        let sync = initialized(0u32);
        let _outer = sync.lock();
        let _inner = sync.lock();
    }

    #[test]
    fn test_guard_mutates_state() {
        let sync = initialized(Vec::<u8>::new());
        sync.lock().push(7);
        sync.lock().push(9);
        assert_eq!(*sync.lock(), vec![7, 9]);
    }

    #[test]
    fn test_unlock_releases() {
        let sync = initialized(0u32);

        let guard = sync.lock();
        assert!(is_held(&sync));
        sync.unlock(guard);
        assert!(!is_held(&sync));

        let other = Arc::clone(&sync);
        thread::spawn(move || *other.lock() += 1).join().unwrap();
        assert_eq!(*sync.lock(), 1);
    }

    #[test]
    fn test_wait_times_out() {
        let sync = initialized(0u32);
        let mut guard = sync.lock();

        let start = Instant::now();
        let outcome = sync.condvar_wait(&mut guard, 50);

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(outcome.timed_out());
        assert!(start.elapsed() >= Duration::from_millis(45));
        assert!(is_held(&sync));
    }

    #[test]
    fn test_wait_signaled() {
        let sync = initialized(false);
        let mut guard = sync.lock();

        let signaler = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                let mut guard = sync.lock();
                *guard = true;
                sync.condvar_signal(&guard);
            })
        };

        let mut outcome = WaitOutcome::TimedOut;
        while !*guard {
            outcome = sync.condvar_wait(&mut guard, 5000);
        }

        assert_eq!(outcome, WaitOutcome::Signaled);
        assert!(is_held(&sync));
        drop(guard);
        signaler.join().unwrap();
    }

    #[test]
    fn test_non_positive_timeout_waits_for_signal() {
        let sync = initialized(false);
        let mut guard = sync.lock();

        let signaler = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(80));
                let mut guard = sync.lock();
                *guard = true;
                sync.condvar_signal(&guard);
            })
        };

        let start = Instant::now();
        while !*guard {
            assert_eq!(sync.condvar_wait(&mut guard, 0), WaitOutcome::Signaled);
        }

        // A zero timeout must not have returned immediately.
        assert!(start.elapsed() >= Duration::from_millis(70));
        drop(guard);
        signaler.join().unwrap();
    }

    #[test]
    fn test_other_thread_locks_during_wait() {
        let sync = initialized(0u32);
        let mut guard = sync.lock();

        let other = Arc::clone(&sync);
        let locker = thread::spawn(move || {
            *other.lock() += 1;
        });

        // The waiting thread releases the mutex, so the locker can finish.
        while *guard == 0 {
            sync.condvar_wait(&mut guard, 10);
        }
        assert_eq!(*guard, 1);
        drop(guard);
        locker.join().unwrap();
    }

    #[test]
    fn test_concurrent_locks_exclusive() {
        let sync = initialized(0u64);
        let inside = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let sync = Arc::clone(&sync);
                let inside = Arc::clone(&inside);
                let overlapped = Arc::clone(&overlapped);
                thread::spawn(move || {
                    for _ in 0..2000 {
                        let mut guard = sync.lock();
                        if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                            overlapped.store(true, Ordering::SeqCst);
                        }
                        *guard += 1;
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert!(!overlapped.load(Ordering::SeqCst));
        assert_eq!(*sync.lock(), 4000);
    }
}
