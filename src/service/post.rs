use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use tracing::instrument;

use crate::cache::EntityCache;
use crate::config::EntityTierConfig;
use crate::error::Error;
use crate::error::Result;
use crate::key::PostCountKey;
use crate::key::PostListKey;
use crate::loader::PostCountLoader;
use crate::loader::PostListLoader;
use crate::loading::LoadingCache;
use crate::model::Post;
use crate::model::ALL_USERS;
use crate::model::ORDER_MODE_HOT;
use crate::traits::CommentCountSink;
use crate::traits::PostStore;
use crate::traits::RemoteCache;
use crate::traits::Sanitizer;
use crate::types::FieldUpdate;

/// Read and write paths of discussion posts.
///
/// The hot listing of all users and the total row count are served by local loading caches; any other listing goes to
/// the store. Single posts go through the [`EntityCache`].
pub struct PostService<S, R>
where
    S: PostStore,
    R: RemoteCache,
{
    store:      Arc<S>,
    posts:      EntityCache<S, R>,
    list_cache: LoadingCache<PostListLoader<S>>,
    rows_cache: LoadingCache<PostCountLoader<S>>,
}

impl<S, R> PostService<S, R>
where
    S: PostStore,
    R: RemoteCache,
{
    pub fn with_config(
        store: Arc<S>,
        remote: Arc<R>,
        sanitizer: Arc<dyn Sanitizer>,
        config: &EntityTierConfig,
    ) -> Result<Self> {
        Ok(Self {
            posts: EntityCache::with_config(Arc::clone(&store), remote, sanitizer, &config.remote)?,
            list_cache: LoadingCache::with_config(
                "posts.list",
                Arc::new(PostListLoader::new(Arc::clone(&store))),
                &config.local,
            )?,
            rows_cache: LoadingCache::with_config(
                "posts.rows",
                Arc::new(PostCountLoader::new(Arc::clone(&store))),
                &config.local,
            )?,
            store,
        })
    }

    pub fn entity_cache(&self) -> &EntityCache<S, R> {
        &self.posts
    }

    pub fn list_cache(&self) -> &LoadingCache<PostListLoader<S>> {
        &self.list_cache
    }

    pub fn rows_cache(&self) -> &LoadingCache<PostCountLoader<S>> {
        &self.rows_cache
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn find_discuss_posts(
        &self,
        user_id: i64,
        offset: u32,
        limit: u32,
        order_mode: i32,
    ) -> Result<Arc<Vec<Post>>> {
        if user_id == ALL_USERS && order_mode == ORDER_MODE_HOT {
            return self.list_cache.get(&PostListKey::new(offset, limit)).await;
        }

        debug!(user_id, order_mode, "load post list from store");
        let posts = self
            .store
            .select_posts(user_id, offset, limit, order_mode)
            .await
            .map_err(Error::store)?;
        Ok(Arc::new(posts))
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn find_discuss_post_rows(&self, user_id: i64) -> Result<u64> {
        if user_id == ALL_USERS {
            return self.rows_cache.get(&PostCountKey::new(user_id)).await;
        }
        self.store.select_post_rows(user_id).await.map_err(Error::store)
    }

    /// Escape and filter title and content, persist the post and seed the remote tier with it.
    pub async fn add_discuss_post(&self, post: &mut Post) -> Result<u64> {
        self.posts.add(post).await
    }

    pub async fn find_discuss_post_by_id(&self, id: i64) -> Result<Option<Post>> {
        self.posts.find_by_id(id).await
    }

    pub async fn update_comment_count(&self, id: i64, comment_count: u64) -> Result<u64> {
        self.posts
            .invalidate_and_mutate(id, FieldUpdate::CommentCount(comment_count))
            .await
    }

    pub async fn update_type(&self, id: i64, post_type: i32) -> Result<u64> {
        self.posts.invalidate_and_mutate(id, FieldUpdate::Type(post_type)).await
    }

    pub async fn update_status(&self, id: i64, status: i32) -> Result<u64> {
        self.posts.invalidate_and_mutate(id, FieldUpdate::Status(status)).await
    }

    pub async fn update_score(&self, id: i64, score: f64) -> Result<u64> {
        self.posts.invalidate_and_mutate(id, FieldUpdate::Score(score)).await
    }
}

#[async_trait]
impl<S, R> CommentCountSink for PostService<S, R>
where
    S: PostStore,
    R: RemoteCache,
{
    async fn update_comment_count(&self, post_id: i64, count: u64) -> Result<u64> {
        PostService::update_comment_count(self, post_id, count).await
    }
}
