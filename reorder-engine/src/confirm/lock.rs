//! Per-cycle exclusive locks
//!
//! One lock per pending-order identity serializes every confirmation attempt
//! for that cycle; attempts for different cycles never contend. The lock is
//! deliberately held across the outbound gateway call - no duplicate charge
//! even under true concurrency, at the cost of queueing retries behind
//! gateway latency - so acquisition is bounded by a timeout to keep a stuck
//! caller from wedging the cycle forever.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::ConfirmError;

/// Registry of per-pending-order locks
pub struct CycleLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl CycleLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquire the exclusive lock for one pending order
    ///
    /// The guard releases on every exit path, including panics and early
    /// returns, because release is drop-based. Times out with
    /// [`ConfirmError::ConcurrencyTimeout`] rather than queueing forever.
    pub async fn acquire(&self, pending_order_id: &str) -> Result<OwnedMutexGuard<()>, ConfirmError> {
        let lock = self
            .locks
            .entry(pending_order_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| ConfirmError::ConcurrencyTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_times_out_when_held() {
        let locks = CycleLocks::new(Duration::from_millis(50));
        let _held = locks.acquire("po-1").await.unwrap();

        let result = locks.acquire("po-1").await;
        assert!(matches!(result, Err(ConfirmError::ConcurrencyTimeout)));
    }

    #[tokio::test]
    async fn test_different_cycles_do_not_contend() {
        let locks = CycleLocks::new(Duration::from_millis(50));
        let _held = locks.acquire("po-1").await.unwrap();

        // A different pending order acquires immediately
        assert!(locks.acquire("po-2").await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_releases_on_drop() {
        let locks = CycleLocks::new(Duration::from_millis(50));
        {
            let _held = locks.acquire("po-1").await.unwrap();
        }
        assert!(locks.acquire("po-1").await.is_ok());
    }
}
