//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     inventory.rs (HTTP discovery query or static config list)
//!     → populate() (fail fast on unreachable / empty)
//!     → store.rs (name → Arc<[ServiceInstance]>)
//!
//! Per request:
//!     dispatcher → list(name) → Snapshot or None ("no instances")
//! ```
//!
//! # Design Decisions
//! - Append-only, populated once before traffic is accepted
//! - Snapshots are immutable; instances are never mutated in place
//! - No health checking or eviction

pub mod instance;
pub mod inventory;
pub mod store;

pub use instance::ServiceInstance;
pub use inventory::{populate, HttpInventory, InventoryError, InventorySource, StaticInventory};
pub use store::{ServiceRegistry, Snapshot};
