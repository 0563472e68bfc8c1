use std::sync::Arc;
use tracing::debug;
use tracing::instrument;

use crate::cache::EntityCache;
use crate::config::EntityTierConfig;
use crate::error::Error;
use crate::error::Result;
use crate::key::CommentCountKey;
use crate::key::CommentListKey;
use crate::loader::CommentCountLoader;
use crate::loader::CommentListLoader;
use crate::loading::LoadingCache;
use crate::model::Comment;
use crate::traits::CommentCountSink;
use crate::traits::CommentStore;
use crate::traits::RemoteCache;
use crate::traits::Sanitizer;
use crate::types::EntityKind;

/// Read and write paths of comments.
///
/// Pages and counts of comments per entity come from local loading caches. Adding a comment to a post pushes the
/// post's recomputed comment count to the [`CommentCountSink`], which invalidates the post's remote entry.
pub struct CommentService<S, R>
where
    S: CommentStore,
    R: RemoteCache,
{
    store:       Arc<S>,
    comments:    EntityCache<S, R>,
    list_cache:  LoadingCache<CommentListLoader<S>>,
    count_cache: LoadingCache<CommentCountLoader<S>>,
    post_counts: Arc<dyn CommentCountSink>,
}

impl<S, R> CommentService<S, R>
where
    S: CommentStore,
    R: RemoteCache,
{
    pub fn with_config(
        store: Arc<S>,
        remote: Arc<R>,
        sanitizer: Arc<dyn Sanitizer>,
        post_counts: Arc<dyn CommentCountSink>,
        config: &EntityTierConfig,
    ) -> Result<Self> {
        Ok(Self {
            comments: EntityCache::with_config(Arc::clone(&store), remote, sanitizer, &config.remote)?,
            list_cache: LoadingCache::with_config(
                "comments.list",
                Arc::new(CommentListLoader::new(Arc::clone(&store))),
                &config.local,
            )?,
            count_cache: LoadingCache::with_config(
                "comments.count",
                Arc::new(CommentCountLoader::new(Arc::clone(&store))),
                &config.local,
            )?,
            post_counts,
            store,
        })
    }

    pub fn entity_cache(&self) -> &EntityCache<S, R> {
        &self.comments
    }

    pub fn list_cache(&self) -> &LoadingCache<CommentListLoader<S>> {
        &self.list_cache
    }

    pub fn count_cache(&self) -> &LoadingCache<CommentCountLoader<S>> {
        &self.count_cache
    }

    pub async fn find_comments_by_entity(
        &self,
        entity_type: i32,
        entity_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Arc<Vec<Comment>>> {
        self.list_cache
            .get(&CommentListKey::new(entity_type, entity_id, offset, limit))
            .await
    }

    pub async fn find_comment_count(&self, entity_type: i32, entity_id: i64) -> Result<u64> {
        self.count_cache
            .get(&CommentCountKey::new(entity_type, entity_id))
            .await
    }

    /// Persist a comment and seed the remote tier with it. A comment on a post also refreshes the post's comment
    /// count, read straight from the store rather than from the local count cache.
    ///
    /// The count is pushed before the comment is seeded; a failed seed still leaves the post counted.
    #[instrument(level = "trace", skip(self, comment), fields(entity_type = comment.entity_type, entity_id = comment.entity_id))]
    pub async fn add_comment(&self, comment: &mut Comment) -> Result<u64> {
        let rows = self.comments.persist(comment).await?;

        if comment.parent_kind() == Some(EntityKind::Post) {
            let count = self
                .store
                .select_count_by_entity(comment.entity_type, comment.entity_id)
                .await
                .map_err(Error::store)?;
            debug!(post_id = comment.entity_id, count, "refreshing post comment count");
            self.post_counts.update_comment_count(comment.entity_id, count).await?;
        }

        if rows > 0 {
            self.comments.seed(comment).await?;
        }

        Ok(rows)
    }

    pub async fn find_comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        self.comments.find_by_id(id).await
    }
}
