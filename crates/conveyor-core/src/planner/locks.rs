//! Per-plan mutual exclusion.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// Registry of one async lock per plan id, created on first use.
///
/// Every read-modify-write of a plan holds its lock, so concurrent updates
/// of one plan are applied one after the other. A lock leaves the registry
/// once nobody holds or waits for it.
#[derive(Debug, Clone, Default)]
pub(crate) struct PlanLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl PlanLocks {
    /// Waits for exclusive access to `plan_id`.
    pub(crate) async fn acquire(&self, plan_id: &str) -> PlanGuard {
        let lock = self.registry().entry(plan_id.to_string()).or_default().clone();
        PlanGuard {
            guard: Some(lock.lock_owned().await),
            plan_id: plan_id.to_string(),
            locks: self.clone(),
        }
    }

    fn registry(&self) -> MutexGuard<'_, LockMap> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self, plan_id: &str) {
        let mut locks = self.registry();
        // The registry holds the only reference when no task is waiting
        if locks
            .get(plan_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(plan_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.registry().len()
    }
}

/// Exclusive access to one plan, released on drop.
pub(crate) struct PlanGuard {
    guard: Option<OwnedMutexGuard<()>>,
    plan_id: String,
    locks: PlanLocks,
}

impl Drop for PlanGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.plan_id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_plan_is_exclusive() {
        let locks = PlanLocks::default();
        let guard = locks.acquire("plan-a").await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire("plan-a")).await;
        assert!(second.is_err(), "second acquire must wait");

        drop(guard);
        let _guard = locks.acquire("plan-a").await;
    }

    #[tokio::test]
    async fn test_plans_do_not_block_each_other() {
        let locks = PlanLocks::default();
        let _a = locks.acquire("plan-a").await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("plan-b"))
            .await
            .expect("other plans are independent");
    }

    #[tokio::test]
    async fn test_released_locks_leave_registry() {
        let locks = PlanLocks::default();
        let guard = locks.acquire("plan-a").await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("plan-a").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1, "a waiting task keeps the lock registered");
        waiter.await.expect("waiter panicked");
        assert_eq!(locks.len(), 0);

        drop(locks.acquire("plan-b").await);
        assert_eq!(locks.len(), 0);
    }
}
