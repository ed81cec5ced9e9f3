//! # Response Cache
//!
//! Serialized responses are cached under a [`CacheKey`] and associated with a
//! set of [`CacheTag`]s. Mutations evict by tag; entries never expire on their
//! own. The cache is injected into handlers as `Arc<dyn TagAwareCache>`.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::OwnedMutexGuard;

pub mod key;
pub mod memory;

pub use key::{CacheKey, CacheTag};
pub use memory::InMemoryTagCache;

/// Tag-aware key/value store for serialized responses.
#[async_trait]
pub trait TagAwareCache: Send + Sync {
    /// Returns the cached payload for `key`, if any.
    async fn get(&self, key: &CacheKey) -> Option<Bytes>;

    /// Stores `payload` under `key` and registers it with every tag.
    ///
    /// The write is skipped (and `false` returned) when one of `tags` was
    /// invalidated, or the cache cleared, after `generation` was observed, so
    /// a value computed from stale reads never outlives the mutation that
    /// made it stale. Invalidations of unrelated tags do not block the write.
    async fn insert(
        &self,
        key: &CacheKey,
        payload: Bytes,
        tags: &[CacheTag],
        generation: u64,
    ) -> bool;

    /// Evicts every entry registered under any of `tags`. Returns the number of evicted entries.
    async fn invalidate(&self, tags: &[CacheTag]) -> usize;

    /// Drops every entry.
    async fn clear(&self);

    /// Monotonic counter bumped by every invalidation and clear.
    async fn generation(&self) -> u64;

    /// Acquires the single-flight lock for `key`.
    async fn lock_key(&self, key: &CacheKey) -> KeyLock;
}

impl<'c> dyn TagAwareCache + 'c {
    /// Returns the cached payload for `key` or runs `compute` and caches its result.
    ///
    /// Concurrent misses on the same key are serialized so that `compute`
    /// runs once; the others observe the stored value. Errors from `compute`
    /// are returned as-is and nothing is cached.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &CacheKey,
        tags: &[CacheTag],
        compute: F,
    ) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Bytes, E>> + Send,
        E: Send,
    {
        if let Some(hit) = self.get(key).await {
            tracing::debug!(cache_key = %key, "cache hit");
            return Ok(hit);
        }

        let _flight = self.lock_key(key).await;
        if let Some(hit) = self.get(key).await {
            tracing::debug!(cache_key = %key, "cache hit after wait");
            return Ok(hit);
        }

        tracing::info!(cache_key = %key, "cache miss");
        let generation = self.generation().await;
        let payload = compute().await?;

        if !self.insert(key, payload.clone(), tags, generation).await {
            tracing::debug!(cache_key = %key, "cache write skipped after concurrent invalidation");
        }

        Ok(payload)
    }
}

type LockSlots = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Registry of per-key async locks used for single-flight computation.
#[derive(Debug, Default, Clone)]
pub struct KeyLocks {
    slots: LockSlots,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &CacheKey) -> KeyLock {
        let rendered = key.to_string();
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(rendered.clone()).or_default())
        };

        let guard = slot.lock_owned().await;
        KeyLock {
            key: rendered,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    /// Number of keys that currently have a holder or waiters.
    pub fn in_flight(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held while a value for one key is being computed.
#[derive(Debug)]
pub struct KeyLock {
    key: String,
    slots: LockSlots,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference lives in the map and one in our guard; more means waiters.
        let idle = slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) <= 2);
        if idle {
            slots.remove(&self.key);
        }
        drop(guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> Arc<dyn TagAwareCache> {
        Arc::new(InMemoryTagCache::new(16))
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let cache = cache();
        let key = CacheKey::new("numbers").with("page", 1);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let payload = cache
                .get_or_compute(&key, &[CacheTag::ProductList], move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(Bytes::from_static(b"[1,2,3]"))
                })
                .await
                .unwrap();
            assert_eq!(&payload[..], b"[1,2,3]");
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache = cache();
        let key = CacheKey::new("flaky");

        let result = cache
            .get_or_compute(&key, &[], || async { Err::<Bytes, _>("boom") })
            .await;
        assert_eq!(result, Err("boom"));
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_misses_compute_once() {
        let cache = cache();
        let key = CacheKey::new("slow");
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(&key, &[CacheTag::ProductList], || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok::<_, Infallible>(Bytes::from_static(b"done"))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(&handle.await.unwrap().unwrap()[..], b"done");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_during_compute_discards_the_write() {
        let cache = cache();
        let key = CacheKey::new("racy");
        let tag = CacheTag::UserList { customer_id: 1 };

        let inner = Arc::clone(&cache);
        let payload = cache
            .get_or_compute(&key, &[tag], || async move {
                inner.invalidate(&[tag]).await;
                Ok::<_, Infallible>(Bytes::from_static(b"stale"))
            })
            .await
            .unwrap();

        assert_eq!(&payload[..], b"stale");
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn unrelated_invalidation_during_compute_keeps_the_write() {
        let cache = cache();
        let key = CacheKey::new("products");

        let inner = Arc::clone(&cache);
        cache
            .get_or_compute(&key, &[CacheTag::ProductList], || async move {
                inner
                    .invalidate(&[CacheTag::UserList { customer_id: 7 }])
                    .await;
                Ok::<_, Infallible>(Bytes::from_static(b"fresh"))
            })
            .await
            .unwrap();

        assert_eq!(cache.get(&key).await.as_deref(), Some(&b"fresh"[..]));
    }

    #[tokio::test]
    async fn key_locks_are_released() {
        let locks = KeyLocks::new();
        let key = CacheKey::new("lock");
        {
            let _lock = locks.acquire(&key).await;
            assert_eq!(locks.in_flight(), 1);
        }
        assert_eq!(locks.in_flight(), 0);
    }
}
