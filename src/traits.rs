use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::error::Result;
use crate::key::CompositeKey;
use crate::model::Comment;
use crate::model::Post;
use crate::types::EntityKind;
use crate::types::FieldUpdate;

/// An entity that can be cached by id in the remote tier.
pub trait CachedEntity: Serialize + DeserializeOwned + Debug + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> i64;

    /// Reject an entity that cannot be persisted. Called before anything else happens on the write path.
    fn validate(&self) -> Result<()>;

    /// Apply the pre-store text transformations.
    fn sanitize(&mut self, sanitizer: &dyn Sanitizer);
}

/// Text transformations applied before persistence. Escaping always runs before filtering.
pub trait Sanitizer: Send + Sync + 'static {
    fn escape(&self, text: &str) -> String;
    fn filter(&self, text: &str) -> String;
}

/// Client of the shared distributed cache.
///
/// A `set` with an empty payload is how the negative marker is stored, so implementations must report such a key as
/// `Some(vec![])` rather than `None`.
#[async_trait]
pub trait RemoteCache: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;
    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), Self::Error>;
    async fn delete(&self, key: &str) -> Result<(), Self::Error>;
}

/// Point operations of the system of record for one entity kind.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    type Entity: CachedEntity;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn select_by_id(&self, id: i64) -> Result<Option<Self::Entity>, Self::Error>;

    /// Persist a new entity and assign its generated id. Returns the number of affected rows.
    async fn insert(&self, entity: &mut Self::Entity) -> Result<u64, Self::Error>;

    async fn update_field(&self, id: i64, update: FieldUpdate) -> Result<u64, Self::Error>;
}

#[async_trait]
pub trait CommentStore: EntityStore<Entity = Comment> {
    async fn select_comments_by_entity(
        &self,
        entity_type: i32,
        entity_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Comment>, Self::Error>;

    async fn select_count_by_entity(&self, entity_type: i32, entity_id: i64) -> Result<u64, Self::Error>;
}

#[async_trait]
pub trait PostStore: EntityStore<Entity = Post> {
    async fn select_posts(
        &self,
        user_id: i64,
        offset: u32,
        limit: u32,
        order_mode: i32,
    ) -> Result<Vec<Post>, Self::Error>;

    async fn select_post_rows(&self, user_id: i64) -> Result<u64, Self::Error>;
}

/// Backing computation of a [`LoadingCache`](crate::loading::LoadingCache).
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    type Key: CompositeKey;
    type Value: Debug + Clone + Send + Sync + 'static;

    async fn load(&self, key: &Self::Key) -> Result<Self::Value>;
}

/// Receiver of a freshly recomputed comment count of a post.
#[async_trait]
pub trait CommentCountSink: Send + Sync + 'static {
    async fn update_comment_count(&self, post_id: i64, count: u64) -> Result<u64>;
}
