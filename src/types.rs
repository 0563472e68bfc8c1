use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::IntoStaticStr;

/// Kind of a cached entity. The discriminant is the `entityType` value stored with comments, which can be attached
/// either to a post or to another comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Post    = 1,
    Comment = 2,
}

impl EntityKind {
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Post),
            2 => Some(Self::Comment),
            _ => None,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Outcome of a remote tier lookup.
///
/// The three states never overlap: an empty payload is the negative marker and is never handed to a decoder, while a
/// key the remote cache knows nothing about is reported as `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue<T> {
    /// No record of the key at all.
    Absent,
    /// The store confirmed that the entity does not exist.
    NegativeHit,
    /// The entity itself.
    PositiveHit(T),
}

impl CachedValue<Vec<u8>> {
    /// Classify a raw remote payload.
    pub fn from_payload(payload: Option<Vec<u8>>) -> Self {
        match payload {
            None => Self::Absent,
            Some(bytes) if bytes.is_empty() => Self::NegativeHit,
            Some(bytes) => Self::PositiveHit(bytes),
        }
    }
}

impl<T> CachedValue<T> {
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::NegativeHit)
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::PositiveHit(_))
    }

    pub fn try_map<U, E, F>(self, f: F) -> Result<CachedValue<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(match self {
            Self::Absent => CachedValue::Absent,
            Self::NegativeHit => CachedValue::NegativeHit,
            Self::PositiveHit(v) => CachedValue::PositiveHit(f(v)?),
        })
    }
}

/// A mutation of a field visible to cached reads. Applying one always invalidates the remote entry first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldUpdate {
    Status(i32),
    Type(i32),
    Score(f64),
    CommentCount(u64),
}

impl FieldUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Type(_) => "type",
            Self::Score(_) => "score",
            Self::CommentCount(_) => "comment_count",
        }
    }
}
