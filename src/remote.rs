use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::instrument;

use crate::error::Error;
use crate::error::Result;
use crate::traits::RemoteCache;
use crate::ttl::TtlJitter;
use crate::types::CachedValue;

/// Adapter over a [`RemoteCache`] client that speaks in [`CachedValue`] terms and applies a jittered TTL to every
/// write.
pub struct RemoteTier<R>
where
    R: RemoteCache,
{
    client: Arc<R>,
    jitter: TtlJitter,
}

impl<R> RemoteTier<R>
where
    R: RemoteCache,
{
    pub fn new(client: Arc<R>, jitter: TtlJitter) -> Self {
        Self { client, jitter }
    }

    pub fn client(&self) -> Arc<R> {
        Arc::clone(&self.client)
    }

    pub fn jitter(&self) -> TtlJitter {
        self.jitter
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn lookup(&self, key: &str) -> Result<CachedValue<Vec<u8>>> {
        let payload = self.client.get(key).await.map_err(Error::remote)?;
        Ok(CachedValue::from_payload(payload))
    }

    /// Store an entity payload. Returns the TTL it was given.
    #[instrument(level = "trace", skip(self, payload), fields(len = payload.len()))]
    pub async fn put_positive(&self, key: &str, payload: Vec<u8>) -> Result<Duration> {
        // An empty payload would read back as the negative marker.
        if payload.is_empty() {
            return Err(Error::invalid_argument(format!(
                "refusing to store an empty positive payload under '{key}'"
            )));
        }
        let ttl = self.jitter.sample();
        self.client.set(key, payload, ttl).await.map_err(Error::remote)?;
        Ok(ttl)
    }

    /// Remember that the store has no entity for the key. Returns the TTL the marker was given.
    #[instrument(level = "trace", skip(self))]
    pub async fn put_negative(&self, key: &str) -> Result<Duration> {
        let ttl = self.jitter.sample();
        self.client.set(key, Vec::new(), ttl).await.map_err(Error::remote)?;
        debug!(key, ?ttl, "negative marker stored");
        Ok(ttl)
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.client.delete(key).await.map_err(Error::remote)
    }
}

impl<R> std::fmt::Debug for RemoteTier<R>
where
    R: RemoteCache,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTier").field("jitter", &self.jitter).finish()
    }
}
