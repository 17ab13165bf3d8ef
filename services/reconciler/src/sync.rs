//! Cancellable lock primitive
//!
//! `ContextMutex<T>` is a mutex whose acquisition can be abandoned: dropping
//! the acquire future (a disconnected request) walks away cleanly, and
//! `close()` (shutdown) wakes every waiter with `LockError::Cancelled`.
//! Acquisition races the inner `tokio::sync::Mutex` lock against the close
//! signal; the mutex's lock future is cancel safe, so losing the race
//! abandons the acquisition without ever holding the lock.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, Notify};

/// Lock acquisition failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    #[error("lock acquisition cancelled by shutdown")]
    Cancelled,
}

/// Mutex with cancellable acquisition
pub struct ContextMutex<T> {
    value: Mutex<T>,
    closed: AtomicBool,
    close_signal: Notify,
}

impl<T> ContextMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }

    /// Acquire the lock, waiting until it is free.
    ///
    /// Returns `LockError::Cancelled` if the mutex is closed while waiting
    /// (or was already closed). Dropping the returned future before it
    /// resolves abandons the acquisition without ever holding the lock.
    pub async fn lock(&self) -> Result<ContextGuard<'_, T>, LockError> {
        // Register interest in the close signal before reading the flag so
        // a close landing between the two cannot be missed.
        let closed = self.close_signal.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();

        if self.closed.load(Ordering::Acquire) {
            return Err(LockError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = &mut closed => Err(LockError::Cancelled),
            guard = self.value.lock() => Ok(ContextGuard { inner: guard }),
        }
    }

    /// Acquire the lock only if it is immediately free.
    pub fn try_lock(&self) -> Option<ContextGuard<'_, T>> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.value
            .try_lock()
            .ok()
            .map(|inner| ContextGuard { inner })
    }

    /// Close the mutex: every pending and future `lock` call fails with
    /// `LockError::Cancelled`. A guard already held stays valid until drop.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.close_signal.notify_waiters();
    }

    /// Consume the mutex and return the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: fmt::Debug> fmt::Debug for ContextMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.try_lock() {
            Ok(guard) => f.debug_struct("ContextMutex").field("value", &*guard).finish(),
            Err(_) => f.debug_struct("ContextMutex").field("value", &"<locked>").finish(),
        }
    }
}

/// Exclusive access to the value inside a `ContextMutex`
///
/// The lock is released when the guard drops.
pub struct ContextGuard<'a, T> {
    inner: MutexGuard<'a, T>,
}

impl<T> Deref for ContextGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for ContextGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_gives_exclusive_access() {
        let mu = ContextMutex::new(0u64);
        {
            let mut guard = mu.lock().await.unwrap();
            *guard += 1;
        }
        let guard = mu.lock().await.unwrap();
        assert_eq!(*guard, 1);
    }

    #[tokio::test]
    async fn test_try_lock_fails_while_held() {
        let mu = ContextMutex::new(());
        let guard = mu.lock().await.unwrap();
        assert!(mu.try_lock().is_none());
        drop(guard);
        assert!(mu.try_lock().is_some());
    }

    #[tokio::test]
    async fn test_close_cancels_waiter() {
        let mu = Arc::new(ContextMutex::new(()));
        let guard = mu.lock().await.unwrap();

        let waiter = {
            let mu = Arc::clone(&mu);
            tokio::spawn(async move { mu.lock().await.map(|_| ()) })
        };

        // Let the waiter queue up behind the held guard, then close.
        tokio::time::sleep(Duration::from_millis(10)).await;
        mu.close();

        assert_eq!(waiter.await.unwrap(), Err(LockError::Cancelled));
        drop(guard);
    }

    #[tokio::test]
    async fn test_lock_after_close_fails() {
        let mu = ContextMutex::new(());
        mu.close();
        assert_eq!(mu.lock().await.err(), Some(LockError::Cancelled));
        assert!(mu.try_lock().is_none());
    }

    #[tokio::test]
    async fn test_contended_counter_stays_consistent() {
        let mu = Arc::new(ContextMutex::new(0u64));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let mu = Arc::clone(&mu);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let mut guard = mu.lock().await.unwrap();
                    *guard += 1;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*mu.lock().await.unwrap(), 800);
    }
}
