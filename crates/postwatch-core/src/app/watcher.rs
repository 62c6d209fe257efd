//! PostWatcher - polls one post until it is gone or no longer interesting.
//!
//! # Flow (one iteration)
//! 1. fetch details (one request)
//! 2. classify: rejected -> terminate (banned / deleted / gone)
//! 3. upsert the post snapshot
//! 4. upsert replies, following the pagination cursor page by page
//! 5. score hotness of the snapshot from step 3 -> terminate if decayed
//! 6. sleep the current backoff, double it, repeat

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::domain::{AccountName, PostId, PostSnapshot, ReplySnapshot, Termination};
use crate::error::WatchError;
use crate::policy::{BackoffPolicy, HotnessPolicy, Verdict};
use crate::ports::{
    Clock, DetailsResponse, DocumentStore, FeedClient, FeedRejection, RejectionKind,
    ReplyDetails, SentimentScorer,
};
use crate::registry::{WatchGuard, WatcherRegistry};

/// Everything a watcher of one account needs. Cheap to clone.
#[derive(Clone)]
pub struct WatchContext {
    pub registry: Arc<WatcherRegistry>,
    pub feed: Arc<dyn FeedClient>,
    pub store: Arc<dyn DocumentStore>,
    pub sentiment: Arc<dyn SentimentScorer>,
    pub clock: Arc<dyn Clock>,
    pub hotness: HotnessPolicy,
    pub backoff: BackoffPolicy,
}

impl WatchContext {
    pub fn account(&self) -> &AccountName {
        self.registry.account()
    }
}

pub struct PostWatcher {
    ctx: WatchContext,
    guard: WatchGuard,
    /// Snapshot persisted by the latest successful poll.
    last_saved: Option<PostSnapshot>,
}

impl PostWatcher {
    /// `guard` must come from `ctx.registry`.
    pub fn new(ctx: WatchContext, guard: WatchGuard) -> Self {
        Self {
            ctx,
            guard,
            last_saved: None,
        }
    }

    pub fn post_id(&self) -> &PostId {
        self.guard.post_id()
    }

    pub fn account(&self) -> &AccountName {
        self.ctx.account()
    }

    /// Poll until a terminal condition.
    ///
    /// The registry entry is finished when the watcher is dropped, so every
    /// return path (including `Err`) releases it exactly once.
    pub async fn run(mut self) -> Result<Termination, WatchError> {
        self.guard.begin()?;
        let mut backoff = self.ctx.backoff.start();
        loop {
            if let Some(termination) = self.poll_once().await? {
                return Ok(termination);
            }
            let delay = backoff.next_delay();
            debug!(
                account = %self.account(),
                post_id = %self.post_id(),
                delay_secs = delay.as_secs(),
                polls = backoff.polls(),
                "next poll scheduled"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch(&self, cursor: Option<&str>) -> Result<DetailsResponse, WatchError> {
        self.ctx.registry.record_request();
        Ok(self.ctx.feed.details(self.post_id(), cursor).await?)
    }

    async fn poll_once(&mut self) -> Result<Option<Termination>, WatchError> {
        let page = match self.fetch(None).await? {
            DetailsResponse::Rejected(rejection) => return self.rejected(rejection).await.map(Some),
            DetailsResponse::Page(page) => page,
        };
        let Some(details) = page.details.as_ref() else {
            warn!(
                account = %self.account(),
                post_id = %self.post_id(),
                "details missing from response"
            );
            return Ok(Some(Termination::OtherGone {
                error: "missing_details".into(),
            }));
        };

        let polarity = self.ctx.sentiment.polarity(&details.message);
        let snapshot = PostSnapshot::from_details(details, page.banned, page.readonly, polarity);
        let created = self.ctx.store.save_post(&snapshot).await?;
        debug!(
            account = %self.account(),
            post_id = %self.post_id(),
            votes = snapshot.vote_count,
            replies = snapshot.child_count,
            "{}",
            if created { "post created" } else { "post updated" }
        );
        self.last_saved = Some(snapshot.clone());

        self.save_replies(&page.replies, &snapshot).await?;
        let mut cursor = page.next_cursor().map(str::to_string);
        while let Some(current) = cursor.take() {
            match self.fetch(Some(&current)).await? {
                DetailsResponse::Page(next) => {
                    trace!(
                        account = %self.account(),
                        post_id = %self.post_id(),
                        cursor = %current,
                        replies = next.replies.len(),
                        "reply page"
                    );
                    self.save_replies(&next.replies, &snapshot).await?;
                    cursor = next.next_cursor().map(str::to_string);
                }
                DetailsResponse::Rejected(rejection) => {
                    // The next full poll will classify it.
                    warn!(
                        account = %self.account(),
                        post_id = %self.post_id(),
                        error = %rejection.error,
                        "reply page rejected"
                    );
                }
            }
        }

        let now = self.ctx.clock.now();
        match self.ctx.hotness.judge(&snapshot, now) {
            Verdict::Expired { hotness } => {
                info!(
                    account = %self.account(),
                    post_id = %self.post_id(),
                    points = snapshot.points(),
                    age_hours = snapshot.age_hours(now),
                    hotness,
                    "post decayed, watch ends"
                );
                Ok(Some(Termination::DecayExpired { hotness }))
            }
            Verdict::Continue { hotness } => {
                trace!(
                    account = %self.account(),
                    post_id = %self.post_id(),
                    hotness,
                    "post still hot"
                );
                Ok(None)
            }
        }
    }

    async fn save_replies(
        &self,
        replies: &[ReplyDetails],
        post: &PostSnapshot,
    ) -> Result<(), WatchError> {
        for reply in replies {
            let polarity = self.ctx.sentiment.polarity(&reply.message);
            let snapshot = ReplySnapshot::from_details(reply, post, polarity);
            self.ctx.store.save_reply(&snapshot).await?;
        }
        Ok(())
    }

    async fn rejected(&mut self, rejection: FeedRejection) -> Result<Termination, WatchError> {
        match rejection.kind() {
            RejectionKind::Blocked => {
                warn!(account = %self.account(), post_id = %self.post_id(), "post banned");
                if let Some(mut post) = self.last_saved.take() {
                    post.banned = true;
                    self.ctx.store.save_post(&post).await?;
                }
                Ok(Termination::Banned)
            }
            RejectionKind::Deleted => {
                warn!(account = %self.account(), post_id = %self.post_id(), "post deleted");
                if let Some(mut post) = self.last_saved.take() {
                    post.deleted = true;
                    self.ctx.store.save_post(&post).await?;
                }
                Ok(Termination::Deleted)
            }
            RejectionKind::Other => {
                warn!(
                    account = %self.account(),
                    post_id = %self.post_id(),
                    error = %rejection.error,
                    "post gone"
                );
                Ok(Termination::OtherGone {
                    error: rejection.error,
                })
            }
        }
    }
}
