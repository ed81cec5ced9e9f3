//! In-process [`TagAwareCache`] backed by an LRU map and a tag index.

use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
};

use async_trait::async_trait;
use axum::body::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;

use super::{CacheKey, CacheTag, KeyLock, KeyLocks, TagAwareCache};

#[derive(Debug)]
struct Entry {
    payload: Bytes,
    tags: Vec<CacheTag>,
}

#[derive(Debug)]
struct State {
    entries: LruCache<String, Entry>,
    tag_index: HashMap<CacheTag, HashSet<String>>,
    generation: u64,
    /// Generation at which each tag was last invalidated.
    invalidated_at: HashMap<CacheTag, u64>,
    cleared_at: u64,
}

impl State {
    /// Whether any of `tags` was invalidated after `generation` was observed.
    fn is_stale(&self, tags: &[CacheTag], generation: u64) -> bool {
        self.cleared_at > generation
            || tags.iter().any(|tag| {
                self.invalidated_at
                    .get(tag)
                    .is_some_and(|&at| at > generation)
            })
    }

    fn unindex(&mut self, key: &str, tags: &[CacheTag]) {
        for tag in tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
    }
}

/// Single-node tag-aware cache.
///
/// Capacity only bounds memory; correctness relies on explicit invalidation.
#[derive(Debug)]
pub struct InMemoryTagCache {
    state: Mutex<State>,
    locks: KeyLocks,
}

impl InMemoryTagCache {
    /// Creates a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(State {
                entries: LruCache::new(capacity),
                tag_index: HashMap::new(),
                generation: 0,
                invalidated_at: HashMap::new(),
                cleared_at: 0,
            }),
            locks: KeyLocks::new(),
        }
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TagAwareCache for InMemoryTagCache {
    async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let rendered = key.to_string();
        let mut state = self.state.lock().await;
        state.entries.get(&rendered).map(|entry| entry.payload.clone())
    }

    async fn insert(
        &self,
        key: &CacheKey,
        payload: Bytes,
        tags: &[CacheTag],
        generation: u64,
    ) -> bool {
        let rendered = key.to_string();
        let mut state = self.state.lock().await;
        if state.is_stale(tags, generation) {
            return false;
        }

        if let Some(previous) = state.entries.pop(&rendered) {
            state.unindex(&rendered, &previous.tags);
        }

        for tag in tags {
            state
                .tag_index
                .entry(*tag)
                .or_default()
                .insert(rendered.clone());
        }

        let entry = Entry {
            payload,
            tags: tags.to_vec(),
        };
        if let Some((evicted_key, evicted)) = state.entries.push(rendered, entry) {
            tracing::debug!(cache_key = %evicted_key, "evicted least recently used entry");
            state.unindex(&evicted_key, &evicted.tags);
        }

        true
    }

    async fn invalidate(&self, tags: &[CacheTag]) -> usize {
        let mut state = self.state.lock().await;
        state.generation += 1;
        let generation = state.generation;

        let mut evicted = 0;
        for tag in tags {
            state.invalidated_at.insert(*tag, generation);
            let Some(keys) = state.tag_index.remove(tag) else {
                continue;
            };
            for key in keys {
                if let Some(entry) = state.entries.pop(&key) {
                    state.unindex(&key, &entry.tags);
                    evicted += 1;
                }
            }
        }

        tracing::debug!(?tags, evicted, "invalidated cache tags");
        evicted
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.cleared_at = state.generation;
        state.invalidated_at.clear();
        state.entries.clear();
        state.tag_index.clear();
    }

    async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    async fn lock_key(&self, key: &CacheKey) -> KeyLock {
        self.locks.acquire(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn put(cache: &InMemoryTagCache, key: &CacheKey, body: &'static [u8], tags: &[CacheTag]) {
        let generation = cache.generation().await;
        assert!(
            cache
                .insert(key, Bytes::from_static(body), tags, generation)
                .await
        );
    }

    #[tokio::test]
    async fn invalidate_evicts_only_tagged_entries() {
        let cache = InMemoryTagCache::new(8);
        let alice = CacheKey::new("users.list").with("owner", 1);
        let bob = CacheKey::new("users.list").with("owner", 2);

        put(&cache, &alice, b"a", &[CacheTag::UserList { customer_id: 1 }]).await;
        put(&cache, &bob, b"b", &[CacheTag::UserList { customer_id: 2 }]).await;

        let evicted = cache
            .invalidate(&[CacheTag::UserList { customer_id: 1 }])
            .await;

        assert_eq!(evicted, 1);
        assert!(cache.get(&alice).await.is_none());
        assert_eq!(cache.get(&bob).await.as_deref(), Some(&b"b"[..]));
    }

    #[tokio::test]
    async fn entry_with_several_tags_is_evicted_by_any() {
        let cache = InMemoryTagCache::new(8);
        let key = CacheKey::new("users.detail").with("id", 9);
        put(
            &cache,
            &key,
            b"u",
            &[
                CacheTag::UserDetail { user_id: 9 },
                CacheTag::UserList { customer_id: 1 },
            ],
        )
        .await;

        cache.invalidate(&[CacheTag::UserDetail { user_id: 9 }]).await;
        assert!(cache.is_empty().await);

        // The other tag no longer references the evicted key.
        assert_eq!(
            cache
                .invalidate(&[CacheTag::UserList { customer_id: 1 }])
                .await,
            0
        );
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = InMemoryTagCache::new(2);
        let first = CacheKey::new("k").with("n", 1);
        let second = CacheKey::new("k").with("n", 2);
        let third = CacheKey::new("k").with("n", 3);

        put(&cache, &first, b"1", &[CacheTag::ProductList]).await;
        put(&cache, &second, b"2", &[CacheTag::ProductList]).await;
        put(&cache, &third, b"3", &[CacheTag::ProductList]).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&first).await.is_none());
        assert_eq!(cache.invalidate(&[CacheTag::ProductList]).await, 2);
    }

    #[tokio::test]
    async fn stale_generation_is_rejected() {
        let cache = InMemoryTagCache::new(4);
        let key = CacheKey::new("k");
        let generation = cache.generation().await;
        cache.invalidate(&[CacheTag::ProductList]).await;

        let stored = cache
            .insert(&key, Bytes::from_static(b"x"), &[CacheTag::ProductList], generation)
            .await;
        assert!(!stored);
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn unrelated_invalidation_keeps_the_write() {
        let cache = InMemoryTagCache::new(4);
        let products = CacheKey::new("products.list");
        let generation = cache.generation().await;
        cache
            .invalidate(&[CacheTag::UserList { customer_id: 1 }])
            .await;

        let stored = cache
            .insert(
                &products,
                Bytes::from_static(b"p"),
                &[CacheTag::ProductList],
                generation,
            )
            .await;
        assert!(stored);
        assert_eq!(cache.get(&products).await.as_deref(), Some(&b"p"[..]));
    }

    #[tokio::test]
    async fn clear_rejects_any_pending_write() {
        let cache = InMemoryTagCache::new(4);
        let key = CacheKey::new("k");
        let generation = cache.generation().await;
        cache.clear().await;

        assert!(
            !cache
                .insert(&key, Bytes::from_static(b"x"), &[CacheTag::ProductList], generation)
                .await
        );
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = InMemoryTagCache::new(4);
        put(&cache, &CacheKey::new("a"), b"a", &[CacheTag::ProductList]).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
