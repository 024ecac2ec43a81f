use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Unit of mutual exclusion for every stock-affecting operation.
pub type StockKey = (Uuid, Uuid); // (warehouse_id, product_id)

/// In-process lock table over `(warehouse_id, product_id)` keys.
///
/// Operations touching the same key serialize; disjoint keys never contend.
/// Multi-key acquisition (bundle reservations) always proceeds in ascending
/// key order so two operations over overlapping leaf sets cannot deadlock.
/// Cross-process exclusion is provided by the backing store's row locks;
/// this table keeps same-process contention cheap and bounded.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<StockKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquires every key in `keys` (deduplicated, ascending order), waiting
    /// at most `timeout` per key. Guards release on drop; on timeout all
    /// previously acquired guards are dropped and `LockTimeout` is returned.
    pub async fn acquire(
        &self,
        keys: &[StockKey],
        timeout: Duration,
    ) -> Result<Vec<OwnedMutexGuard<()>>, ServiceError> {
        let mut ordered: Vec<StockKey> = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            let lock = self
                .locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value()
                .clone();
            let guard = tokio::time::timeout(timeout, lock.lock_owned())
                .await
                .map_err(|_| ServiceError::LockTimeout)?;
            guards.push(guard);
        }

        Ok(guards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disjoint_keys_do_not_block_each_other() {
        let locks = KeyLocks::new();
        let a = (Uuid::new_v4(), Uuid::new_v4());
        let b = (Uuid::new_v4(), Uuid::new_v4());

        let _held = locks
            .acquire(&[a], Duration::from_millis(50))
            .await
            .expect("first key");
        locks
            .acquire(&[b], Duration::from_millis(50))
            .await
            .expect("disjoint key must not contend");
    }

    #[tokio::test]
    async fn same_key_times_out_while_held() {
        let locks = KeyLocks::new();
        let key = (Uuid::new_v4(), Uuid::new_v4());

        let _held = locks
            .acquire(&[key], Duration::from_millis(50))
            .await
            .expect("first acquisition");
        let err = locks
            .acquire(&[key], Duration::from_millis(20))
            .await
            .expect_err("second acquisition must time out");
        assert!(matches!(err, ServiceError::LockTimeout));
    }

    #[tokio::test]
    async fn overlapping_key_sets_acquire_in_consistent_order() {
        let locks = Arc::new(KeyLocks::new());
        let wh = Uuid::new_v4();
        let x = (wh, Uuid::new_v4());
        let y = (wh, Uuid::new_v4());

        // Two tasks request the same pair in opposite orders; ordered
        // acquisition means both complete instead of deadlocking.
        let l1 = locks.clone();
        let t1 = tokio::spawn(async move {
            for _ in 0..50 {
                let _g = l1.acquire(&[x, y], Duration::from_secs(1)).await.unwrap();
            }
        });
        let l2 = locks.clone();
        let t2 = tokio::spawn(async move {
            for _ in 0..50 {
                let _g = l2.acquire(&[y, x], Duration::from_secs(1)).await.unwrap();
            }
        });

        t1.await.unwrap();
        t2.await.unwrap();
    }
}
