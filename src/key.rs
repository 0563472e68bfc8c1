//! Cache keys.
//!
//! Every aggregate query shape has its own key type with a fixed number of integer fields. In memory the keys stay
//! typed; they are rendered as colon-joined strings (`entityType:entityId:offset:limit` and alike) and parsed back only
//! when they cross a process boundary. Parsing is strict: a blank string, a wrong number of fields, or a field that is
//! not an integer of the right range is an [`Error::InvalidArgument`], never a cache miss.
//!
//! Single entities use a namespaced key, see [`EntityKey`].
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

use crate::error::Error;
use crate::error::Result;
use crate::types::EntityKind;

const SEPARATOR: char = ':';
const ENTITY_KEY_PREFIX: &str = "cache";

pub trait CompositeKey: Debug + Display + FromStr<Err = Error> + Hash + Eq + Clone + Send + Sync + 'static {
    /// Number of fields in the string form.
    const ARITY: usize;
    /// Human-readable name of the query shape.
    const SHAPE: &'static str;
}

fn split_fields<'a, const N: usize>(shape: &str, raw: &'a str) -> Result<[&'a str; N]> {
    if raw.trim().is_empty() {
        return Err(Error::invalid_argument(format!("blank {shape} key")));
    }

    let parts = raw.split(SEPARATOR).collect::<Vec<_>>();
    let found = parts.len();
    <[&str; N]>::try_from(parts).map_err(|_| {
        Error::invalid_argument(format!(
            "{shape} key '{raw}' must have {N} field(s), found {found}"
        ))
    })
}

fn parse_field<T: FromStr>(shape: &str, name: &str, raw: &str) -> Result<T> {
    let invalid = || Error::invalid_argument(format!("field '{name}' of {shape} key is not a valid integer: '{raw}'"));
    // Rendered keys never carry a plus sign; accepting one would give a key two spellings.
    if raw.starts_with('+') {
        return Err(invalid());
    }
    raw.parse::<T>().map_err(|_| invalid())
}

macro_rules! composite_key {
    (@count $head:ident $($tail:ident)*) => { 1usize $(+ composite_key!(@one $tail))* };
    (@one $x:ident) => { 1usize };

    ($(#[$meta:meta])* $name:ident, $shape:literal { $($field:ident : $ty:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            $(pub $field: $ty),+
        }

        impl $name {
            #[inline]
            pub fn new($($field: $ty),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl CompositeKey for $name {
            const ARITY: usize = composite_key!(@count $($field)+);
            const SHAPE: &'static str = $shape;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let fields = [$(self.$field.to_string()),+];
                f.write_str(&fields.join(":"))
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(raw: &str) -> Result<Self> {
                let [$($field),+] = split_fields::<{ composite_key!(@count $($field)+) }>($shape, raw)?;
                Ok(Self {
                    $($field: parse_field($shape, stringify!($field), $field)?),+
                })
            }
        }
    };
}

composite_key!(
    /// A page of comments attached to an entity.
    CommentListKey, "comment list" {
        entity_type: i32,
        entity_id: i64,
        offset: u32,
        limit: u32,
    }
);

composite_key!(
    /// Number of comments attached to an entity.
    CommentCountKey, "comment count" {
        entity_type: i32,
        entity_id: i64,
    }
);

composite_key!(
    /// A page of the "all users, hot first" post list.
    PostListKey, "post list" {
        offset: u32,
        limit: u32,
    }
);

composite_key!(
    /// Number of posts of a user; user 0 stands for all users.
    PostCountKey, "post count" {
        user_id: i64,
    }
);

/// Remote tier key of a single entity: `cache:<kind>:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id:   i64,
}

impl EntityKey {
    #[inline]
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ENTITY_KEY_PREFIX}{SEPARATOR}{}{SEPARATOR}{}", self.kind, self.id)
    }
}
