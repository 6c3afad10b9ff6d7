//! Repository layer for the local cache

pub mod guest_cache;
pub mod kv_store;

pub use guest_cache::{GUEST_LIST_KEY, GuestCache, uploads_key};
pub use kv_store::{KeyValueStore, MemoryStore, SqliteStore};
