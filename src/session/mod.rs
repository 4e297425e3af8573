//! Durable session record and the short-TTL validation cache.
//!
//! Both are owned and mutated exclusively by the session validator.

mod cache;
mod store;
mod types;

pub use cache::ValidationCache;
pub use store::PersistedSessionStore;
pub use types::{CacheEntry, PersistedSession};
