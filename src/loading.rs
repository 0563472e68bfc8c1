use fieldx::fxstruct;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing::instrument;

use crate::config::LocalTierConfig;
use crate::error::Error;
use crate::error::Result;
use crate::traits::Loader;

/// Bounded, write-expiring, in-process cache in front of a [`Loader`].
///
/// Concurrent [`get`](Self::get) calls for the same missing key wait on a single loader invocation; the store never
/// sees more than one in-flight query per key. A failed load is reported to every waiter and is not cached.
///
/// There is no invalidation API: cached aggregates are allowed to be stale for up to the write TTL.
///
/// ```ignore
/// let cache = LoadingCache::builder()
///     .name("comments.count")
///     .loader(Arc::new(CommentCountLoader::new(store)))
///     .max_capacity(1_000)
///     .time_to_live(Duration::from_secs(180))
///     .build()?;
///
/// let count = cache.get(&CommentCountKey::new(EntityKind::Post.code(), 42)).await?;
/// ```
#[fxstruct(
    sync,
    no_new,
    default(off),
    builder(
        doc("Builder object of [`LoadingCache`].", "", "See [`LoadingCache::builder()`] method."),
        method_doc("Implement builder pattern for [`LoadingCache`]."),
    )
)]
pub struct LoadingCache<L>
where
    L: Loader,
{
    #[fieldx(get(clone))]
    loader: Arc<L>,

    /// Cache name. Most useful for debugging and logging.
    #[fieldx(get(copy), default("local"))]
    name: &'static str,

    #[fieldx(get(copy), default(10_000))]
    max_capacity: u64,

    /// Entries expire this long after they were written, regardless of how often they are read.
    #[fieldx(get(copy), default(Duration::from_secs(180)))]
    time_to_live: Duration,

    #[fieldx(lazy, get(clone), builder(off))]
    cache: Arc<Cache<L::Key, L::Value>>,
}

impl<L> LoadingCache<L>
where
    L: Loader,
{
    /// Create a cache sized and timed by the local tier configuration of an entity kind.
    pub fn with_config(name: &'static str, loader: Arc<L>, config: &LocalTierConfig) -> Result<Self> {
        config.validate(name)?;
        Self::builder()
            .name(name)
            .loader(loader)
            .max_capacity(config.max_size)
            .time_to_live(config.expire_after_write())
            .build()
            .map_err(|err| Error::invalid_argument(format!("cannot build local cache '{name}': {err}")))
    }

    fn build_cache(&self) -> Arc<Cache<L::Key, L::Value>> {
        Arc::new(
            Cache::builder()
                .name(self.name())
                .max_capacity(self.max_capacity())
                .time_to_live(self.time_to_live())
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        )
    }

    #[instrument(level = "trace", skip(self), fields(cache = self.name()))]
    pub async fn get(&self, key: &L::Key) -> Result<L::Value> {
        let loader = self.loader();
        let value = self
            .cache()
            .try_get_with(key.clone(), async move {
                debug!("[{}] LOAD({key})", self.name());
                loader.load(key).await
            })
            .await?;
        Ok(value)
    }

    /// Look up by the string form of a key, as received from outside the process.
    ///
    /// A malformed key fails with [`Error::InvalidArgument`] before the cache or the loader are touched.
    pub async fn get_raw(&self, raw_key: &str) -> Result<L::Value> {
        let key = raw_key.parse::<L::Key>()?;
        self.get(&key).await
    }

    pub fn contains_key(&self, key: &L::Key) -> bool {
        self.cache().contains_key(key)
    }

    /// Approximate number of live entries. Call [`run_pending_tasks`](Self::run_pending_tasks) first for an exact
    /// figure.
    pub fn entry_count(&self) -> u64 {
        self.cache().entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.cache().run_pending_tasks().await;
    }
}

impl<L> Debug for LoadingCache<L>
where
    L: Loader,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingCache")
            .field("name", &self.name())
            .field("max_capacity", &self.max_capacity())
            .field("time_to_live", &self.time_to_live())
            .finish()
    }
}
