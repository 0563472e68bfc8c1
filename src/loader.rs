//! Store-backed loaders of the local aggregate caches. Each one runs a single store query for its key shape and
//! hands the result back untouched.
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::key::CommentCountKey;
use crate::key::CommentListKey;
use crate::key::PostCountKey;
use crate::key::PostListKey;
use crate::model::Comment;
use crate::model::Post;
use crate::model::ALL_USERS;
use crate::model::ORDER_MODE_HOT;
use crate::traits::CommentStore;
use crate::traits::Loader;
use crate::traits::PostStore;

macro_rules! store_loader {
    ($name:ident, $store_trait:ident) => {
        pub struct $name<S>
        where
            S: $store_trait,
        {
            store: Arc<S>,
        }

        impl<S> $name<S>
        where
            S: $store_trait,
        {
            pub fn new(store: Arc<S>) -> Self {
                Self { store }
            }
        }
    };
}

store_loader!(CommentListLoader, CommentStore);
store_loader!(CommentCountLoader, CommentStore);
store_loader!(PostListLoader, PostStore);
store_loader!(PostCountLoader, PostStore);

#[async_trait]
impl<S> Loader for CommentListLoader<S>
where
    S: CommentStore,
{
    type Key = CommentListKey;
    type Value = Arc<Vec<Comment>>;

    async fn load(&self, key: &CommentListKey) -> Result<Self::Value> {
        debug!(%key, "load comment list from store");
        let comments = self
            .store
            .select_comments_by_entity(key.entity_type, key.entity_id, key.offset, key.limit)
            .await
            .map_err(Error::store)?;
        Ok(Arc::new(comments))
    }
}

#[async_trait]
impl<S> Loader for CommentCountLoader<S>
where
    S: CommentStore,
{
    type Key = CommentCountKey;
    type Value = u64;

    async fn load(&self, key: &CommentCountKey) -> Result<u64> {
        debug!(%key, "load comment count from store");
        self.store
            .select_count_by_entity(key.entity_type, key.entity_id)
            .await
            .map_err(Error::store)
    }
}

#[async_trait]
impl<S> Loader for PostListLoader<S>
where
    S: PostStore,
{
    type Key = PostListKey;
    type Value = Arc<Vec<Post>>;

    // Only the "everyone, hottest first" listing is cached locally.
    async fn load(&self, key: &PostListKey) -> Result<Self::Value> {
        debug!(%key, "load hot post list from store");
        let posts = self
            .store
            .select_posts(ALL_USERS, key.offset, key.limit, ORDER_MODE_HOT)
            .await
            .map_err(Error::store)?;
        Ok(Arc::new(posts))
    }
}

#[async_trait]
impl<S> Loader for PostCountLoader<S>
where
    S: PostStore,
{
    type Key = PostCountKey;
    type Value = u64;

    async fn load(&self, key: &PostCountKey) -> Result<u64> {
        debug!(%key, "load post rows from store");
        self.store.select_post_rows(key.user_id).await.map_err(Error::store)
    }
}
