//! Exclusive-access token for the worker side of the queue.
//!
//! A [`QueueLock`] is owned by a queue store. The worker acquires a
//! [`QueueLease`] for the span of one cycle (dequeue through terminal update)
//! and passes it to every worker-side store call. Dropping the lease releases
//! the lock, so sleeps taken after a cycle never block another holder.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Process-wide lock serializing worker-side queue mutation.
#[derive(Debug, Clone, Default)]
pub struct QueueLock {
    inner: Arc<Mutex<()>>,
}

impl QueueLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the lock is free and take it.
    pub async fn acquire(&self) -> QueueLease {
        let guard = self.inner.clone().lock_owned().await;
        QueueLease {
            owner: self.inner.clone(),
            _guard: guard,
        }
    }

    /// Take the lock only if nobody holds it.
    pub fn try_acquire(&self) -> Option<QueueLease> {
        let guard = self.inner.clone().try_lock_owned().ok()?;
        Some(QueueLease {
            owner: self.inner.clone(),
            _guard: guard,
        })
    }

    /// Whether `lease` was issued by this lock.
    pub fn issued(&self, lease: &QueueLease) -> bool {
        Arc::ptr_eq(&self.inner, &lease.owner)
    }
}

/// Proof of holding a [`QueueLock`]. Released on drop.
#[derive(Debug)]
pub struct QueueLease {
    owner: Arc<Mutex<()>>,
    _guard: OwnedMutexGuard<()>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lease_is_exclusive_until_dropped() {
        let lock = QueueLock::new();
        let lease = lock.acquire().await;
        assert!(lock.try_acquire().is_none());
        drop(lease);
        assert!(lock.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_issued_rejects_foreign_lease() {
        let a = QueueLock::new();
        let b = QueueLock::new();
        let lease = a.acquire().await;
        assert!(a.issued(&lease));
        assert!(!b.issued(&lease));
    }

    #[tokio::test]
    async fn test_clones_share_the_same_lock() {
        let lock = QueueLock::new();
        let clone = lock.clone();
        let lease = clone.acquire().await;
        assert!(lock.issued(&lease));
        assert!(lock.try_acquire().is_none());
    }
}
