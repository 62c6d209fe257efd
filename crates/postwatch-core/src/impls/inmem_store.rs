//! InMemoryDocumentStore - bucketed document maps kept in process memory.
//!
//! Used by tests and by the binary when no store directory is configured.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{PostId, PostSnapshot, ReplySnapshot};
use crate::error::StoreError;
use crate::ports::DocumentStore;

#[derive(Default)]
struct StoreState {
    /// bucket -> id -> document
    posts: BTreeMap<String, HashMap<PostId, PostSnapshot>>,
    replies: BTreeMap<String, HashMap<PostId, ReplySnapshot>>,
    post_writes: usize,
    reply_writes: usize,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: Mutex<StoreState>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, id: &PostId) -> Option<PostSnapshot> {
        let state = self.state.lock();
        state.posts.values().find_map(|bucket| bucket.get(id).cloned())
    }

    pub fn reply(&self, id: &PostId) -> Option<ReplySnapshot> {
        let state = self.state.lock();
        state.replies.values().find_map(|bucket| bucket.get(id).cloned())
    }

    /// Distinct posts stored.
    pub fn post_count(&self) -> usize {
        self.state.lock().posts.values().map(HashMap::len).sum()
    }

    /// Distinct replies stored.
    pub fn reply_count(&self) -> usize {
        self.state.lock().replies.values().map(HashMap::len).sum()
    }

    /// Total `save_post` calls, including overwrites.
    pub fn post_writes(&self) -> usize {
        self.state.lock().post_writes
    }

    pub fn reply_writes(&self) -> usize {
        self.state.lock().reply_writes
    }

    pub fn buckets(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .posts
            .keys()
            .chain(state.replies.keys())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn save_post(&self, post: &PostSnapshot) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        state.post_writes += 1;
        let created = state
            .posts
            .entry(post.bucket())
            .or_default()
            .insert(post.id.clone(), post.clone())
            .is_none();
        Ok(created)
    }

    async fn save_reply(&self, reply: &ReplySnapshot) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.reply_writes += 1;
        state
            .replies
            .entry(reply.bucket())
            .or_default()
            .insert(reply.id.clone(), reply.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::fixtures::{post_details, reply_details};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn save_post_is_an_upsert() {
        let store = InMemoryDocumentStore::new();
        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let mut post = PostSnapshot::from_details(&post_details("p1", created, 1), false, false, 0.0);

        assert!(store.save_post(&post).await.unwrap());
        post.vote_count = 9;
        assert!(!store.save_post(&post).await.unwrap());

        assert_eq!(store.post_count(), 1);
        assert_eq!(store.post_writes(), 2);
        assert_eq!(store.post(&PostId::new("p1")).unwrap().vote_count, 9);
        assert_eq!(store.buckets(), vec!["post-berlin-20190301".to_string()]);
    }

    #[tokio::test]
    async fn replies_are_not_duplicated() {
        let store = InMemoryDocumentStore::new();
        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let post = PostSnapshot::from_details(&post_details("p1", created, 1), false, false, 0.0);
        let reply = ReplySnapshot::from_details(&reply_details("r1", "p1", created), &post, 0.0);

        store.save_reply(&reply).await.unwrap();
        store.save_reply(&reply).await.unwrap();

        assert_eq!(store.reply_count(), 1);
        assert_eq!(store.reply_writes(), 2);
    }
}
