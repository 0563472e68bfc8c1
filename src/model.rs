//! Cached forum entities.
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::traits::CachedEntity;
use crate::traits::Sanitizer;
use crate::types::EntityKind;

/// `user_id` value meaning "posts of all users".
pub const ALL_USERS: i64 = 0;
/// Post list order by recency.
pub const ORDER_MODE_LATEST: i32 = 0;
/// Post list order by score. Only this mode, for all users, is served by the local tier.
pub const ORDER_MODE_HOT: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id:            i64,
    pub user_id:       i64,
    pub title:         String,
    pub content:       String,
    pub post_type:     i32,
    pub status:        i32,
    pub create_time:   DateTime<Utc>,
    pub comment_count: u64,
    pub score:         f64,
}

impl Post {
    /// A fresh, not yet persisted post.
    pub fn new<T: Into<String>, C: Into<String>>(user_id: i64, title: T, content: C) -> Self {
        Self {
            id: 0,
            user_id,
            title: title.into(),
            content: content.into(),
            post_type: 0,
            status: 0,
            create_time: Utc::now(),
            comment_count: 0,
            score: 0.0,
        }
    }
}

impl CachedEntity for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if self.user_id <= ALL_USERS {
            return Err(Error::invalid_argument(format!(
                "post must have an author, got user id {}",
                self.user_id
            )));
        }
        Ok(())
    }

    fn sanitize(&mut self, sanitizer: &dyn Sanitizer) {
        self.title = sanitizer.filter(&sanitizer.escape(&self.title));
        self.content = sanitizer.filter(&sanitizer.escape(&self.content));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id:          i64,
    pub user_id:     i64,
    /// Kind of the commented entity, see [`EntityKind::code`].
    pub entity_type: i32,
    pub entity_id:   i64,
    /// The user a reply is addressed to; 0 for none.
    pub target_id:   i64,
    pub content:     String,
    pub status:      i32,
    pub create_time: DateTime<Utc>,
}

impl Comment {
    pub fn new<C: Into<String>>(user_id: i64, parent: EntityKind, entity_id: i64, content: C) -> Self {
        Self {
            id: 0,
            user_id,
            entity_type: parent.code(),
            entity_id,
            target_id: 0,
            content: content.into(),
            status: 0,
            create_time: Utc::now(),
        }
    }

    /// The kind of the entity this comment belongs to, if the stored code is a known one.
    pub fn parent_kind(&self) -> Option<EntityKind> {
        EntityKind::from_code(self.entity_type)
    }
}

impl CachedEntity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if self.parent_kind().is_none() {
            return Err(Error::invalid_argument(format!(
                "unknown entity type {} for a comment",
                self.entity_type
            )));
        }
        if self.entity_id <= 0 {
            return Err(Error::invalid_argument(format!(
                "comment must be attached to an entity, got id {}",
                self.entity_id
            )));
        }
        Ok(())
    }

    fn sanitize(&mut self, sanitizer: &dyn Sanitizer) {
        self.content = sanitizer.filter(&sanitizer.escape(&self.content));
    }
}
