use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::service::CommentService;
use crate::service::PostService;
use crate::traits::CommentCountSink;
use crate::traits::CommentStore;
use crate::traits::PostStore;
use crate::traits::RemoteCache;
use crate::traits::Sanitizer;

/// The complete caching layer: post and comment services sharing one remote cache client and one sanitizer.
///
/// ```ignore
/// let config = CacheConfig::from_toml_str(&std::fs::read_to_string("cache.toml")?)?;
/// let forum = ForumCache::new(&config, post_store, comment_store, redis, sanitizer)?;
/// let hot = forum.posts().find_discuss_posts(0, 0, 10, ORDER_MODE_HOT).await?;
/// ```
pub struct ForumCache<P, C, R>
where
    P: PostStore,
    C: CommentStore,
    R: RemoteCache,
{
    posts:    Arc<PostService<P, R>>,
    comments: CommentService<C, R>,
}

impl<P, C, R> ForumCache<P, C, R>
where
    P: PostStore,
    C: CommentStore,
    R: RemoteCache,
{
    pub fn new(
        config: &CacheConfig,
        post_store: Arc<P>,
        comment_store: Arc<C>,
        remote: Arc<R>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Result<Self> {
        config.validate()?;

        let posts = Arc::new(PostService::with_config(
            post_store,
            Arc::clone(&remote),
            Arc::clone(&sanitizer),
            &config.posts,
        )?);
        let post_counts: Arc<dyn CommentCountSink> = posts.clone();
        let comments = CommentService::with_config(comment_store, remote, sanitizer, post_counts, &config.comments)?;

        Ok(Self { posts, comments })
    }

    pub fn posts(&self) -> &PostService<P, R> {
        &self.posts
    }

    pub fn comments(&self) -> &CommentService<C, R> {
        &self.comments
    }
}
