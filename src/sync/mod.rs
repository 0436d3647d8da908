//! Request deduplication, caching and revalidation.
//!
//! Subscribers ask for a [`RequestKey`]; the coordinator decides whether
//! that means a new request, attaching to one already in flight, or serving
//! the cache. Every subscriber of a key observes the same [`state::SyncState`].

pub mod coordinator;
pub mod key;
pub mod registry;
pub mod state;
pub mod storage;

pub use coordinator::{SyncConfig, SyncEvent, SyncHandle, Subscription};
pub use key::RequestKey;
pub use storage::CacheStore;
