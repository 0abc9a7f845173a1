//! Account cache subsystem.
//!
//! # Data Flow
//! ```text
//! Aggregator lookup(kind, id, pipeline, mode)
//!     → read_through.rs (freshness policy, stale fallback, bypass on store failure)
//!     → store.rs (CacheStore contract, CacheEntry)
//!     → memory.rs (DashMap store with stale retention window)
//! ```
//!
//! # Design Decisions
//! - Keys are `{accountType}:{accountId}`
//! - Entries are never mutated in place, only overwritten or removed
//! - Negative entries are opt-in via `cache.negative_ttl_secs`

pub mod memory;
pub mod read_through;
pub mod store;

pub use memory::MemoryStore;
pub use read_through::{CacheMode, ReadThroughCache};
pub use store::{cache_key, CacheEntry, CacheStore, CachedValue};
