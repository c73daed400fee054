//! Key-value cache behind the token manager.
//!
//! - `entry` — the named cache entries and their lifetimes
//! - `store` — the store contract and backend selection
//! - `memory` — in-process backend
//! - `redis_store` — redis backend

pub mod entry;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheError, KeyValueStore, Store};
