//! Consistent-hash ring of cache shards.
//!
//! # Design Decisions
//! - Each shard owns `virtual_nodes` points on a 64-bit ring
//! - Point positions come from SHA-256, so placement is stable across
//!   processes and restarts
//! - The ring is an immutable snapshot swapped atomically; readers never
//!   block on membership changes
//! - Adding or removing a shard only remaps keys whose owning point
//!   belonged to that shard
//! - Writes sweep stale entries from every shard at most once per TTL, so
//!   keys that are never read again do not accumulate

use arc_swap::ArcSwap;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::{CacheKey, CacheShard, MemoryShard, ShardId};

#[derive(Debug)]
struct RingState<V> {
    points: BTreeMap<u64, ShardId>,
    shards: HashMap<ShardId, Arc<dyn CacheShard<V>>>,
}

impl<V> Clone for RingState<V> {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            shards: self.shards.clone(),
        }
    }
}

impl<V> RingState<V> {
    fn empty() -> Self {
        Self {
            points: BTreeMap::new(),
            shards: HashMap::new(),
        }
    }

    fn owner(&self, hash: u64) -> Option<&ShardId> {
        self.points
            .range(hash..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, id)| id)
    }
}

/// Response cache partitioned over shards by consistent hashing.
#[derive(Debug)]
pub struct CacheRing<V> {
    state: ArcSwap<RingState<V>>,
    virtual_nodes: usize,
    last_sweep: Mutex<Instant>,
}

impl<V> CacheRing<V>
where
    V: Clone + Send + Sync + Debug + 'static,
{
    /// A ring with no shards. Every lookup misses, every store is dropped.
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            state: ArcSwap::from_pointee(RingState::empty()),
            virtual_nodes: virtual_nodes.max(1),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// A ring of in-process shards with the given ids.
    pub fn with_memory_shards(ids: &[String], virtual_nodes: usize) -> Self {
        let ring = Self::new(virtual_nodes);
        for id in ids {
            ring.add_shard(Arc::new(MemoryShard::new(id.clone())));
        }
        ring
    }

    /// Place a shard on the ring, replacing any shard with the same id.
    pub fn add_shard(&self, shard: Arc<dyn CacheShard<V>>) {
        let id = shard.id().to_string();
        let positions: Vec<u64> = (0..self.virtual_nodes)
            .map(|i| ring_hash(format!("{id}#{i}").as_bytes()))
            .collect();

        self.state.rcu(|current| {
            let mut next = RingState::clone(current);
            next.points.retain(|_, owner| *owner != id);
            for position in &positions {
                next.points.insert(*position, id.clone());
            }
            next.shards.insert(id.clone(), Arc::clone(&shard));
            next
        });
        tracing::debug!(shard = %id, virtual_nodes = self.virtual_nodes, "Cache shard added");
    }

    /// Take a shard off the ring. Its entries are discarded.
    pub fn remove_shard(&self, id: &str) -> bool {
        if !self.state.load().shards.contains_key(id) {
            return false;
        }
        self.state.rcu(|current| {
            let mut next = RingState::clone(current);
            next.points.retain(|_, owner| owner != id);
            next.shards.remove(id);
            next
        });
        tracing::debug!(shard = %id, "Cache shard removed");
        true
    }

    /// Id of the shard that owns `key`.
    pub fn shard_for(&self, key: &CacheKey) -> Option<ShardId> {
        self.state.load().owner(ring_hash(key.as_str().as_bytes())).cloned()
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let state = self.state.load();
        let owner = state.owner(ring_hash(key.as_str().as_bytes()))?;
        state.shards.get(owner)?.get(key)
    }

    pub fn put(&self, key: CacheKey, value: V, ttl: Duration) {
        self.sweep_if_due(ttl);
        let state = self.state.load();
        let Some(shard) = state
            .owner(ring_hash(key.as_str().as_bytes()))
            .and_then(|owner| state.shards.get(owner))
        else {
            return;
        };
        shard.set(key, value, ttl);
    }

    /// Purge stale entries from every shard if a full `ttl` has passed since
    /// the last sweep. Concurrent writers skip rather than wait.
    fn sweep_if_due(&self, ttl: Duration) {
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        let now = Instant::now();
        if now.saturating_duration_since(*last_sweep) < ttl {
            return;
        }
        *last_sweep = now;

        let purged: usize = self
            .state
            .load()
            .shards
            .values()
            .map(|shard| shard.purge_expired(now))
            .sum();
        if purged > 0 {
            tracing::debug!(purged, "Expired cache entries swept");
        }
    }

    /// Shard ids currently on the ring, sorted.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        let mut ids: Vec<ShardId> = self.state.load().shards.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Total entries across shards, including ones not yet lazily expired.
    pub fn len(&self) -> usize {
        self.state.load().shards.values().map(|shard| shard.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn ring_hash(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}
