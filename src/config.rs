//! Tier configuration.
//!
//! Loaded from TOML, one section per entity kind:
//!
//! ```toml
//! [posts.local]
//! max-size = 15
//! expire-seconds = 180
//!
//! [posts.remote]
//! ttl-min = 20
//! ttl-max = 40
//! ttl-unit = "minutes"
//! ```
//!
//! Every value is optional. The remote TTL unit defaults to minutes for posts and seconds for comments.
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

use crate::error::Error;
use crate::error::Result;
use crate::ttl::TtlJitter;
use crate::ttl::MAX_TTL_SECONDS;
use crate::ttl::TtlUnit;
use crate::types::EntityKind;

const DEFAULT_LOCAL_MAX_SIZE: u64 = 15;
const DEFAULT_LOCAL_EXPIRE_SECONDS: u64 = 180;
const DEFAULT_REMOTE_TTL_MIN: u64 = 20;
const DEFAULT_REMOTE_TTL_MAX: u64 = 40;

/// Limits of the in-process loading caches of one entity kind. Both the list and the count cache use them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LocalTierConfig {
    /// Maximum number of entries per cache.
    pub max_size:       u64,
    /// Entries expire this many seconds after they were written.
    pub expire_seconds: u64,
}

impl Default for LocalTierConfig {
    fn default() -> Self {
        Self {
            max_size:       DEFAULT_LOCAL_MAX_SIZE,
            expire_seconds: DEFAULT_LOCAL_EXPIRE_SECONDS,
        }
    }
}

impl LocalTierConfig {
    #[inline]
    pub fn expire_after_write(&self) -> Duration {
        Duration::from_secs(self.expire_seconds)
    }

    pub fn validate(&self, owner: &str) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::invalid_argument(format!("{owner} local cache max-size must be positive")));
        }
        if self.expire_seconds == 0 || self.expire_seconds > MAX_TTL_SECONDS {
            return Err(Error::invalid_argument(format!(
                "{owner} local cache expire-seconds must be in 1..={MAX_TTL_SECONDS}, got {}",
                self.expire_seconds
            )));
        }
        Ok(())
    }
}

/// TTL window of the remote tier writes of one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RemoteTierConfig {
    pub ttl_min:  u64,
    pub ttl_max:  u64,
    pub ttl_unit: Option<TtlUnit>,
}

impl Default for RemoteTierConfig {
    fn default() -> Self {
        Self {
            ttl_min:  DEFAULT_REMOTE_TTL_MIN,
            ttl_max:  DEFAULT_REMOTE_TTL_MAX,
            ttl_unit: None,
        }
    }
}

impl RemoteTierConfig {
    pub fn jitter(&self, kind: EntityKind) -> Result<TtlJitter> {
        TtlJitter::new(
            self.ttl_min,
            self.ttl_max,
            self.ttl_unit.unwrap_or_else(|| default_ttl_unit(kind)),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityTierConfig {
    pub local:  LocalTierConfig,
    pub remote: RemoteTierConfig,
}

impl EntityTierConfig {
    fn validate(&self, kind: EntityKind) -> Result<()> {
        self.local.validate(kind.name())?;
        self.remote.jitter(kind)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub posts:    EntityTierConfig,
    pub comments: EntityTierConfig,
}

impl CacheConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.posts.validate(EntityKind::Post)?;
        self.comments.validate(EntityKind::Comment)
    }

    pub fn for_kind(&self, kind: EntityKind) -> &EntityTierConfig {
        match kind {
            EntityKind::Post => &self.posts,
            EntityKind::Comment => &self.comments,
        }
    }
}

fn default_ttl_unit(kind: EntityKind) -> TtlUnit {
    match kind {
        EntityKind::Post => TtlUnit::Minutes,
        EntityKind::Comment => TtlUnit::Seconds,
    }
}
