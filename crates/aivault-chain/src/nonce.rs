use std::future::Future;
use std::sync::Arc;

use ethers::types::U256;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::ChainError;

/// Single-writer nonce allocator for one signing key.
///
/// The next nonce is cached behind a mutex. A [`NonceLease`] keeps the mutex
/// locked until the transaction is either broadcast (`commit`) or abandoned
/// (dropped), so submissions from the same key are serialized and never
/// share a nonce. An abandoned lease clears the cache and the next lease
/// re-reads the node's pending nonce.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    next: Arc<Mutex<Option<U256>>>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the allocator and hands out the next nonce, fetching it with
    /// `fetch` when nothing is cached.
    pub async fn lease<F, Fut>(&self, fetch: F) -> Result<NonceLease<'_>, ChainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<U256, ChainError>>,
    {
        let mut guard = self.next.lock().await;
        let nonce = match *guard {
            Some(nonce) => nonce,
            None => {
                let nonce = fetch().await?;
                *guard = Some(nonce);
                nonce
            }
        };

        Ok(NonceLease {
            guard,
            nonce,
            committed: false,
        })
    }

    /// Cached next nonce, if any. Waits for an in-flight lease to finish.
    pub async fn peek(&self) -> Option<U256> {
        *self.next.lock().await
    }

    /// Replaces the cached value with the node's view. Returns the previous
    /// and new values when they differ.
    pub async fn reconcile<F, Fut>(&self, fetch: F) -> Result<Option<(Option<U256>, U256)>, ChainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<U256, ChainError>>,
    {
        let mut guard = self.next.lock().await;
        let on_chain = fetch().await?;
        let previous = guard.replace(on_chain);

        Ok((previous != Some(on_chain)).then_some((previous, on_chain)))
    }
}

/// Exclusive hold on the next nonce of a signing key.
#[must_use = "dropping a lease without committing invalidates the cached nonce"]
pub struct NonceLease<'a> {
    guard: MutexGuard<'a, Option<U256>>,
    nonce: U256,
    committed: bool,
}

impl NonceLease<'_> {
    pub const fn nonce(&self) -> U256 {
        self.nonce
    }

    /// Marks the nonce as used by a broadcast transaction.
    pub fn commit(mut self) {
        *self.guard = Some(self.nonce + U256::one());
        self.committed = true;
    }
}

impl Drop for NonceLease<'_> {
    fn drop(&mut self) {
        if !self.committed {
            *self.guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_committed_lease_advances_without_refetching() {
        let manager = NonceManager::new();
        let counter = AtomicUsize::new(0);
        let fetches = &counter;
        let fetch = move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(U256::from(7))
        };

        let lease = manager.lease(fetch).await.unwrap();
        assert_eq!(lease.nonce(), U256::from(7));
        lease.commit();

        let lease = manager.lease(fetch).await.unwrap();
        assert_eq!(lease.nonce(), U256::from(8));
        lease.commit();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(manager.peek().await, Some(U256::from(9)));
    }

    #[tokio::test]
    async fn test_dropped_lease_forces_refetch() {
        let manager = NonceManager::new();

        let lease = manager.lease(|| async { Ok(U256::from(3)) }).await.unwrap();
        drop(lease);
        assert_eq!(manager.peek().await, None);

        let lease = manager.lease(|| async { Ok(U256::from(4)) }).await.unwrap();
        assert_eq!(lease.nonce(), U256::from(4));
        lease.commit();
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_cache_empty() {
        let manager = NonceManager::new();

        let result = manager
            .lease(|| async { Err(ChainError::Rpc("connection refused".into())) })
            .await;

        assert!(matches!(result, Err(ChainError::Rpc(_))));
        assert_eq!(manager.peek().await, None);
    }

    #[tokio::test]
    async fn test_concurrent_leases_never_share_a_nonce() {
        let manager = NonceManager::new();
        let mut handles = Vec::new();

        for _ in 0..16 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let lease = manager.lease(|| async { Ok(U256::zero()) }).await.unwrap();
                let nonce = lease.nonce();
                tokio::task::yield_now().await;
                lease.commit();
                nonce
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen.len(), 16);
        assert_eq!(manager.peek().await, Some(U256::from(16)));
    }

    #[tokio::test]
    async fn test_reconcile_reports_drift() {
        let manager = NonceManager::new();
        manager
            .lease(|| async { Ok(U256::from(10)) })
            .await
            .unwrap()
            .commit();

        let drift = manager.reconcile(|| async { Ok(U256::from(14)) }).await.unwrap();
        assert_eq!(drift, Some((Some(U256::from(11)), U256::from(14))));

        let unchanged = manager.reconcile(|| async { Ok(U256::from(14)) }).await.unwrap();
        assert_eq!(unchanged, None);
    }
}
