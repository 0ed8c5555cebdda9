//! Cache shards.
//!
//! A shard is one independent key/value store on the ring. An entry past its
//! TTL is dropped when it is next looked up, or by `purge_expired`, whichever
//! comes first.

use dashmap::DashMap;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use super::CacheKey;

pub type ShardId = String;

/// A stored value and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: CacheKey,
    pub value: V,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.ttl
    }
}

/// Storage behind one ring position.
pub trait CacheShard<V>: Send + Sync + Debug {
    fn id(&self) -> &str;

    /// Fresh value for `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<V>;

    /// Insert or overwrite.
    fn set(&self, key: CacheKey, value: V, ttl: Duration);

    /// Drop every entry that is stale at `now`. Returns how many went.
    fn purge_expired(&self, now: Instant) -> usize;

    /// Entries currently stored, expired or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process shard backed by a concurrent map.
#[derive(Debug)]
pub struct MemoryShard<V> {
    id: ShardId,
    entries: DashMap<CacheKey, CacheEntry<V>>,
}

impl<V> MemoryShard<V> {
    pub fn new(id: impl Into<ShardId>) -> Self {
        Self {
            id: id.into(),
            entries: DashMap::new(),
        }
    }
}

impl<V> CacheShard<V> for MemoryShard<V>
where
    V: Clone + Send + Sync + Debug,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            // The entry may have been refreshed since the check above.
            self.entries.remove_if(key, |_, entry| !entry.is_fresh(now));
        }
        None
    }

    fn set(&self, key: CacheKey, value: V, ttl: Duration) {
        let entry = CacheEntry {
            key: key.clone(),
            value,
            inserted_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key, entry);
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
