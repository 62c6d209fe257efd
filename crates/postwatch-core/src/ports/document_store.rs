//! DocumentStore port - where snapshots end up.
//!
//! Both operations are idempotent upserts keyed by document id. Routing a
//! document to its bucket (see `domain::bucket`) is the store's job.

use async_trait::async_trait;

use crate::domain::{PostSnapshot, ReplySnapshot};
use crate::error::StoreError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upsert a post. Returns `true` if the document did not exist before.
    async fn save_post(&self, post: &PostSnapshot) -> Result<bool, StoreError>;

    /// Upsert a reply.
    async fn save_reply(&self, reply: &ReplySnapshot) -> Result<(), StoreError>;
}
