use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use thiserror::Error;

use crate::model::Comment;
use crate::model::Post;
use crate::model::ORDER_MODE_HOT;
use crate::traits::CachedEntity;
use crate::traits::CommentStore;
use crate::traits::EntityStore;
use crate::traits::PostStore;
use crate::types::FieldUpdate;

#[derive(Debug, Error)]
#[error("store is unavailable")]
pub struct StoreUnavailable;

/// Rows that can be kept in a [`MemoryStore`].
pub trait StoredRow: CachedEntity {
    fn set_id(&mut self, id: i64);
    /// Returns `false` if the update doesn't apply to this kind of row.
    fn apply(&mut self, update: FieldUpdate) -> bool;
}

impl StoredRow for Post {
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn apply(&mut self, update: FieldUpdate) -> bool {
        match update {
            FieldUpdate::Status(status) => self.status = status,
            FieldUpdate::Type(post_type) => self.post_type = post_type,
            FieldUpdate::Score(score) => self.score = score,
            FieldUpdate::CommentCount(count) => self.comment_count = count,
        }
        true
    }
}

impl StoredRow for Comment {
    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn apply(&mut self, update: FieldUpdate) -> bool {
        match update {
            FieldUpdate::Status(status) => {
                self.status = status;
                true
            }
            _ => false,
        }
    }
}

/// A table of one entity kind in memory.
///
/// Every query is counted under its operation name (`select_by_id`, `insert`, `update_field`, `select_range`,
/// `select_count`). Range and count queries can be slowed down to widen race windows.
#[derive(Debug)]
pub struct MemoryStore<E>
where
    E: StoredRow,
{
    rows:        Mutex<BTreeMap<i64, E>>,
    next_id:     AtomicI64,
    calls:       Mutex<HashMap<&'static str, usize>>,
    updates:     Mutex<Vec<(i64, FieldUpdate)>>,
    query_delay: Mutex<Duration>,
    down:        AtomicBool,
}

impl<E> Default for MemoryStore<E>
where
    E: StoredRow,
{
    fn default() -> Self {
        Self {
            rows:        Mutex::new(BTreeMap::new()),
            next_id:     AtomicI64::new(1),
            calls:       Mutex::new(HashMap::new()),
            updates:     Mutex::new(Vec::new()),
            query_delay: Mutex::new(Duration::ZERO),
            down:        AtomicBool::new(false),
        }
    }
}

impl<E> MemoryStore<E>
where
    E: StoredRow,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a row with a known id straight into the table. Not counted as a call.
    pub fn seed(&self, row: E) {
        let id = row.id();
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        self.rows.lock().insert(id, row);
    }

    pub fn row(&self, id: i64) -> Option<E> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or(0)
    }

    /// All `update_field` calls so far.
    pub fn updates(&self) -> Vec<(i64, FieldUpdate)> {
        self.updates.lock().clone()
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock() = delay;
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn record(&self, op: &'static str) -> Result<(), StoreUnavailable> {
        *self.calls.lock().entry(op).or_default() += 1;
        if self.down.load(Ordering::SeqCst) {
            Err(StoreUnavailable)
        }
        else {
            Ok(())
        }
    }

    async fn delay(&self) {
        let delay = *self.query_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn page<F, O>(&self, filter: F, order: O, offset: u32, limit: u32) -> Vec<E>
    where
        F: Fn(&E) -> bool,
        O: Fn(&E, &E) -> std::cmp::Ordering,
    {
        let mut selected = self.rows.lock().values().filter(|row| filter(*row)).cloned().collect::<Vec<_>>();
        selected.sort_by(|a, b| order(a, b));
        selected.into_iter().skip(offset as usize).take(limit as usize).collect()
    }
}

#[async_trait]
impl<E> EntityStore for MemoryStore<E>
where
    E: StoredRow,
{
    type Entity = E;
    type Error = StoreUnavailable;

    async fn select_by_id(&self, id: i64) -> Result<Option<E>, Self::Error> {
        self.record("select_by_id")?;
        Ok(self.row(id))
    }

    async fn insert(&self, entity: &mut E) -> Result<u64, Self::Error> {
        self.record("insert")?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        entity.set_id(id);
        self.rows.lock().insert(id, entity.clone());
        Ok(1)
    }

    async fn update_field(&self, id: i64, update: FieldUpdate) -> Result<u64, Self::Error> {
        self.record("update_field")?;
        self.updates.lock().push((id, update));
        Ok(match self.rows.lock().get_mut(&id) {
            Some(row) => u64::from(row.apply(update)),
            None => 0,
        })
    }
}

#[async_trait]
impl CommentStore for MemoryStore<Comment> {
    async fn select_comments_by_entity(
        &self,
        entity_type: i32,
        entity_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Comment>, Self::Error> {
        self.record("select_range")?;
        self.delay().await;
        Ok(self.page(
            |c| c.status == 0 && c.entity_type == entity_type && c.entity_id == entity_id,
            |a, b| a.create_time.cmp(&b.create_time).then(a.id.cmp(&b.id)),
            offset,
            limit,
        ))
    }

    async fn select_count_by_entity(&self, entity_type: i32, entity_id: i64) -> Result<u64, Self::Error> {
        self.record("select_count")?;
        self.delay().await;
        Ok(self
            .rows
            .lock()
            .values()
            .filter(|c| c.status == 0 && c.entity_type == entity_type && c.entity_id == entity_id)
            .count() as u64)
    }
}

#[async_trait]
impl PostStore for MemoryStore<Post> {
    async fn select_posts(
        &self,
        user_id: i64,
        offset: u32,
        limit: u32,
        order_mode: i32,
    ) -> Result<Vec<Post>, Self::Error> {
        self.record("select_range")?;
        self.delay().await;
        Ok(self.page(
            // Status 2 marks a blocked post.
            |p| p.status != 2 && (user_id == 0 || p.user_id == user_id),
            |a, b| {
                let by_type = b.post_type.cmp(&a.post_type);
                let by_mode = if order_mode == ORDER_MODE_HOT {
                    b.score.total_cmp(&a.score)
                }
                else {
                    std::cmp::Ordering::Equal
                };
                by_type.then(by_mode).then(b.create_time.cmp(&a.create_time)).then(b.id.cmp(&a.id))
            },
            offset,
            limit,
        ))
    }

    async fn select_post_rows(&self, user_id: i64) -> Result<u64, Self::Error> {
        self.record("select_count")?;
        self.delay().await;
        Ok(self
            .rows
            .lock()
            .values()
            .filter(|p| p.status != 2 && (user_id == 0 || p.user_id == user_id))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    #[tokio::test]
    async fn update_field_reports_affected_rows() {
        let store = MemoryStore::<Comment>::new();
        store.seed(Comment::new(1, EntityKind::Post, 7, "hi"));
        let id = store.rows.lock().keys().next().copied().unwrap();

        assert_eq!(store.update_field(id, FieldUpdate::Status(1)).await.unwrap(), 1);
        assert_eq!(store.row(id).unwrap().status, 1);
        // Comments have no score.
        assert_eq!(store.update_field(id, FieldUpdate::Score(2.0)).await.unwrap(), 0);
        assert_eq!(store.update_field(id + 1, FieldUpdate::Status(1)).await.unwrap(), 0);
        assert_eq!(store.calls("update_field"), 3);
    }
}
