//! Response cache.
//!
//! # Data Flow
//! ```text
//! Cacheable route (GET balance / transactions / templates)
//!     → key.rs (method + template + resource id + query)
//!     → ring.rs (SHA-256 position → owning shard)
//!     → shard.rs (DashMap lookup, lazy TTL expiry)
//! ```
//!
//! # Design Decisions
//! - Only successful (2xx) responses are stored
//! - Mutations never read or write the cache and never invalidate it;
//!   reads may be stale for up to one TTL
//! - Shards are pluggable behind `CacheShard`

pub mod key;
pub mod ring;
pub mod shard;

pub use key::CacheKey;
pub use ring::CacheRing;
pub use shard::{CacheEntry, CacheShard, MemoryShard, ShardId};
