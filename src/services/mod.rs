use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

pub mod costing;
pub mod production_orders;
pub mod production_recording;
pub mod products;
pub mod stock_ledger;

pub use costing::CostingService;
pub use production_orders::ProductionOrderService;
pub use production_recording::ProductionRecordingService;
pub use products::ProductService;
pub use stock_ledger::StockLedgerService;

/// Registry of async mutexes keyed by entity id. Services take the lock for a
/// product or order before their read-check-write transaction so concurrent
/// mutations of the same row serialize instead of double-spending.
#[derive(Clone, Default)]
pub struct LockMap {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `id`, creating it on first use. The guard is
    /// owned so it can be held across a transaction.
    pub async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.inner.entry(id).or_default().clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn lock_map_serializes_same_key() {
        let locks = LockMap::new();
        let id = Uuid::new_v4();

        let guard = locks.lock(id).await;
        let locks2 = locks.clone();
        let contender = tokio::spawn(async move {
            let _g = locks2.lock(id).await;
        });

        // The contender must not finish while the first guard is held.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn lock_map_allows_distinct_keys_concurrently() {
        let locks = LockMap::new();
        let _a = locks.lock(Uuid::new_v4()).await;
        // Must not deadlock.
        let _b = locks.lock(Uuid::new_v4()).await;
    }
}
