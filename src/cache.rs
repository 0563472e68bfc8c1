use fieldx::fxstruct;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;
use tracing::instrument;

use crate::config::RemoteTierConfig;
use crate::error::Error;
use crate::error::Result;
use crate::key::EntityKey;
use crate::remote::RemoteTier;
use crate::traits::CachedEntity;
use crate::traits::EntityStore;
use crate::traits::RemoteCache;
use crate::traits::Sanitizer;
use crate::types::CachedValue;
use crate::types::FieldUpdate;

/// Read-through cache of single entities by id, backed by the remote tier and the store.
///
/// Lookups resolve in three states. A positive remote entry is decoded and returned. A negative marker answers
/// "not found" without touching the store. Only a key the remote tier knows nothing about goes to the store, and the
/// outcome is written back either way: the entity, or a negative marker so that repeated lookups of a missing id keep
/// hitting the remote tier. Every write gets a jittered TTL.
///
/// Mutations never update a remote entry in place. The entry is deleted first and the store is updated second; the
/// next read repopulates the remote tier from the updated row.
///
/// ```ignore
/// let posts = EntityCache::with_config(post_store, remote, sanitizer, &config.posts.remote)?;
/// if let Some(post) = posts.find_by_id(42).await? {
///     posts.invalidate_and_mutate(post.id, FieldUpdate::Score(post.score + 1.0)).await?;
/// }
/// ```
#[fxstruct(
    sync,
    no_new,
    default(off),
    builder(
        doc("Builder object of [`EntityCache`].", "", "See [`EntityCache::builder()`] method."),
        method_doc("Implement builder pattern for [`EntityCache`]."),
    )
)]
pub struct EntityCache<S, R>
where
    S: EntityStore,
    R: RemoteCache,
{
    #[fieldx(get(clone))]
    store: Arc<S>,

    #[fieldx(get)]
    remote: RemoteTier<R>,

    /// Pre-store text transformations applied by [`add`](Self::add).
    #[fieldx(get(clone))]
    sanitizer: Arc<dyn Sanitizer>,
}

impl<S, R> EntityCache<S, R>
where
    S: EntityStore,
    R: RemoteCache,
{
    pub fn with_config(
        store: Arc<S>,
        remote: Arc<R>,
        sanitizer: Arc<dyn Sanitizer>,
        config: &RemoteTierConfig,
    ) -> Result<Self> {
        let kind = S::Entity::KIND;
        let jitter = config.jitter(kind)?;
        Self::builder()
            .store(store)
            .remote(RemoteTier::new(remote, jitter))
            .sanitizer(sanitizer)
            .build()
            .map_err(|err| Error::invalid_argument(format!("cannot build {kind} cache: {err}")))
    }

    /// Remote tier key of the entity with the given id.
    #[inline]
    pub fn key_for(&self, id: i64) -> String {
        EntityKey::new(S::Entity::KIND, id).to_string()
    }

    #[instrument(level = "trace", skip(self), fields(kind = %S::Entity::KIND))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<S::Entity>> {
        let key = self.key_for(id);

        match self.remote().lookup(&key).await?.try_map(|payload| decode::<S::Entity>(&key, &payload))? {
            CachedValue::PositiveHit(entity) => Ok(Some(entity)),
            CachedValue::NegativeHit => {
                debug!("[{}] NEGATIVE({key})", S::Entity::KIND);
                Ok(None)
            }
            CachedValue::Absent => {
                debug!("[{}] LOAD({key})", S::Entity::KIND);
                match self.store().select_by_id(id).await.map_err(Error::store)? {
                    Some(entity) => {
                        self.remote().put_positive(&key, encode(&entity)?).await?;
                        Ok(Some(entity))
                    }
                    None => {
                        self.remote().put_negative(&key).await?;
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Validate, sanitize and persist a new entity, then seed the remote tier with it.
    ///
    /// On success the store-assigned id is set on `entity`. Returns the number of affected rows. An invalid entity is
    /// rejected before the sanitizer, the store or the remote tier are touched.
    #[instrument(level = "trace", skip(self, entity), fields(kind = %S::Entity::KIND))]
    pub async fn add(&self, entity: &mut S::Entity) -> Result<u64> {
        let rows = self.persist(entity).await?;
        if rows > 0 {
            self.seed(entity).await?;
        }
        Ok(rows)
    }

    /// The store half of [`add`](Self::add): validate, sanitize and insert. The remote tier is not touched.
    pub async fn persist(&self, entity: &mut S::Entity) -> Result<u64> {
        entity.validate()?;
        entity.sanitize(&*self.sanitizer());
        self.store().insert(entity).await.map_err(Error::store)
    }

    /// Write a positive entry for an already persisted entity.
    pub async fn seed(&self, entity: &S::Entity) -> Result<()> {
        let key = self.key_for(entity.id());
        self.remote().put_positive(&key, encode(entity)?).await?;
        debug!("[{}] SEEDED({key})", S::Entity::KIND);
        Ok(())
    }

    /// Drop the remote entry of `id`, then apply the update to the store.
    #[instrument(level = "trace", skip(self), fields(kind = %S::Entity::KIND))]
    pub async fn invalidate_and_mutate(&self, id: i64, update: FieldUpdate) -> Result<u64> {
        let key = self.key_for(id);
        self.remote().invalidate(&key).await?;
        debug!("[{}] INVALIDATED({key}) before {} update", S::Entity::KIND, update.field_name());
        self.store().update_field(id, update).await.map_err(Error::store)
    }
}

impl<S, R> Debug for EntityCache<S, R>
where
    S: EntityStore,
    R: RemoteCache,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("kind", &S::Entity::KIND)
            .field("remote", self.remote())
            .finish()
    }
}

fn decode<E: CachedEntity>(key: &str, payload: &[u8]) -> Result<E> {
    serde_json::from_slice(payload).map_err(|err| Error::Decode {
        key:    key.to_string(),
        kind:   E::KIND,
        source: Arc::new(err),
    })
}

fn encode<E: CachedEntity>(entity: &E) -> Result<Vec<u8>> {
    serde_json::to_vec(entity).map_err(|err| Error::Encode {
        kind:   E::KIND,
        id:     entity.id(),
        source: Arc::new(err),
    })
}
