use std::sync::Arc;

use thiserror::Error;

use crate::types::EntityKind;

pub type BoxedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the caching layer.
///
/// The type is `Clone` because coalesced loads of the local tier hand the very same failure to every waiting caller.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed key string, invalid entity or an unusable configuration value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A positive remote entry could not be decoded into the expected entity.
    #[error("cannot decode cached {kind} under key '{key}': {source}")]
    Decode {
        key:    String,
        kind:   EntityKind,
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("cannot encode {kind} #{id} for the remote tier: {source}")]
    Encode {
        kind:   EntityKind,
        id:     i64,
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The store or the remote cache failed. Never retried at this layer.
    #[error("upstream failure in {origin}: {source}")]
    Upstream {
        origin: &'static str,
        #[source]
        source: BoxedError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream {
            origin: "store",
            source: Arc::new(err),
        }
    }

    pub(crate) fn remote<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream {
            origin: "remote cache",
            source: Arc::new(err),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

impl From<Arc<Error>> for Error {
    fn from(err: Arc<Error>) -> Self {
        Arc::unwrap_or_clone(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
