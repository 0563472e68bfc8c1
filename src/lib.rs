//! # forum-cache
//!
//! Multi-tier read-through caching for the two hottest entities of a community forum: posts and comments.
//!
//! # The Basics
//!
//! Three tiers stand between a reader and the system of record:
//!
//! - a process-local, bounded, write-expiring [loading cache](loading::LoadingCache) for aggregate queries, i.e. pages
//!   of posts or comments and row counts;
//! - a shared distributed cache, used as an opaque key/value service with TTL, for single entities by id;
//! - the store itself.
//!
//! Both the store and the distributed cache are external collaborators. The crate only knows them through the
//! [`EntityStore`](traits::EntityStore), [`PostStore`](traits::PostStore), [`CommentStore`](traits::CommentStore) and
//! [`RemoteCache`](traits::RemoteCache) traits.
//!
//! # Defending the Store
//!
//! - **Stampedes.** A local cache runs at most one load per key at a time; concurrent callers wait for it.
//! - **Penetration.** When the store confirms that an id does not exist, a negative marker (an empty payload) is
//!   written to the remote tier and subsequent lookups are answered from there. Absent, negative, and positive remote
//!   entries are distinct [`CachedValue`](types::CachedValue) states, never inferred from check order.
//! - **Avalanche.** Every remote write draws its TTL from a configured window with [`TtlJitter`](ttl::TtlJitter), so
//!   keys written together don't expire together.
//!
//! # Consistency
//!
//! Remote entries are never updated in place. A mutation deletes the entry and then updates the store; the next read
//! repopulates the remote tier. Local aggregates are never invalidated explicitly and may be stale for up to their
//! TTL.
//!
//! Adding a comment to a post recomputes the post's comment count from the store and pushes it through the post's
//! invalidate-then-mutate path.

pub mod cache;
pub mod config;
pub mod error;
pub mod forum;
pub mod key;
pub mod loader;
pub mod loading;
pub mod model;
pub mod remote;
pub mod service;
pub mod traits;
pub mod ttl;
pub mod types;

#[doc(inline)]
pub use cache::EntityCache;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use forum::ForumCache;
#[doc(inline)]
pub use loading::LoadingCache;

pub mod prelude {
    pub use crate::cache::EntityCache;
    pub use crate::config::CacheConfig;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::forum::ForumCache;
    pub use crate::key::*;
    pub use crate::loading::LoadingCache;
    pub use crate::model::*;
    pub use crate::service::CommentService;
    pub use crate::service::PostService;
    pub use crate::traits::*;
    pub use crate::ttl::TtlJitter;
    pub use crate::ttl::TtlUnit;
    pub use crate::types::*;
}
