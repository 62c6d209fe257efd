//! AccountPoller - periodic discovery for one account.
//!
//! Every cycle fetches the recent ids of the configured channel, admits each
//! through the registry and spawns one isolated watcher per admitted id.

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::watcher::{PostWatcher, WatchContext};
use crate::config::DiscoverySettings;
use crate::domain::PostId;
use crate::error::{FeedError, WatchError};
use crate::policy::uniform_delay;
use crate::registry::WatchGuard;

pub struct AccountPoller {
    ctx: WatchContext,
    channel: String,
    min_interval_secs: u64,
    max_interval_secs: u64,
    watchers: JoinSet<()>,
}

impl AccountPoller {
    pub fn new(ctx: WatchContext, discovery: &DiscoverySettings) -> Self {
        Self {
            ctx,
            channel: discovery.channel.clone(),
            min_interval_secs: discovery.min_interval_secs,
            max_interval_secs: discovery.max_interval_secs,
            watchers: JoinSet::new(),
        }
    }

    /// Discover forever. Returns only when discovery fails.
    ///
    /// Watchers already spawned are detached and run to their own end.
    pub async fn run(mut self) -> Result<(), WatchError> {
        loop {
            if let Err(e) = self.discover().await {
                error!(
                    account = %self.ctx.account(),
                    error = %e,
                    active = self.watchers.len(),
                    "discovery failed, poller stops"
                );
                self.watchers.detach_all();
                return Err(e.into());
            }
            let pause = uniform_delay(self.min_interval_secs, self.max_interval_secs);
            tokio::time::sleep(pause).await;
        }
    }

    /// One discovery cycle. Returns how many watchers were started.
    pub async fn discover(&mut self) -> Result<usize, FeedError> {
        self.reap();
        let ids = self.ctx.feed.recent(&self.channel).await?;
        let seen = ids.len();

        let mut started = 0;
        for post_id in ids {
            if let Some(guard) = self.ctx.registry.claim(post_id) {
                self.watchers.spawn(watch(self.ctx.clone(), guard));
                started += 1;
            }
        }
        info!(
            account = %self.ctx.account(),
            channel = %self.channel,
            seen,
            started,
            active = self.watchers.len(),
            "discovery"
        );
        Ok(started)
    }

    /// Wait until every spawned watcher has ended.
    pub async fn wait_idle(&mut self) {
        while let Some(res) = self.watchers.join_next().await {
            log_join(res);
        }
    }

    fn reap(&mut self) {
        while let Some(res) = self.watchers.try_join_next() {
            log_join(res);
        }
    }
}

fn log_join(res: Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        // The guard has already finished the watch during unwinding.
        error!(error = %e, "watcher task panicked");
    }
}

async fn watch(ctx: WatchContext, guard: WatchGuard) {
    let account = ctx.account().clone();
    let post_id: PostId = guard.post_id().clone();
    match PostWatcher::new(ctx, guard).run().await {
        Ok(termination) => {
            info!(%account, %post_id, reason = %termination, "watch ended");
        }
        Err(e) => {
            warn!(%account, %post_id, error = %e, "watcher failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::watcher::testkit::{harness, hot, stale};
    use crate::domain::WatchState;
    use crate::impls::{ScriptedFeed, ScriptedResponse};

    fn settings() -> DiscoverySettings {
        DiscoverySettings::default()
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_ids_start_one_watcher_each() {
        let feed = ScriptedFeed::new()
            .with_round(["p1", "p1", "p2"])
            .with_round(["p2", "p3", "p1"])
            .with_responses("p1", [stale("p1")])
            .with_responses("p2", [stale("p2")])
            .with_responses("p3", [stale("p3")]);
        let h = harness(feed);
        let mut poller = AccountPoller::new(h.ctx.clone(), &settings());

        assert_eq!(poller.discover().await.unwrap(), 2);
        assert_eq!(poller.discover().await.unwrap(), 1);
        poller.wait_idle().await;

        for id in ["p1", "p2", "p3"] {
            assert_eq!(h.feed.details_calls(&PostId::new(id)).len(), 1, "{id}");
        }
        assert_eq!(h.registry.stats().done, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_ids_are_not_watched_again() {
        let feed = ScriptedFeed::new()
            .with_round(["p1"])
            .with_responses("p1", [stale("p1")]);
        let h = harness(feed);
        let mut poller = AccountPoller::new(h.ctx.clone(), &settings());

        poller.discover().await.unwrap();
        poller.wait_idle().await;
        assert_eq!(poller.discover().await.unwrap(), 0);

        assert_eq!(h.registry.state_of(&PostId::new("p1")), Some(WatchState::Done));
        assert_eq!(h.feed.details_calls(&PostId::new("p1")).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_uses_configured_channel() {
        let h = harness(ScriptedFeed::new().with_round(Vec::<PostId>::new()));
        let discovery = DiscoverySettings {
            channel: "Local".into(),
            ..settings()
        };
        let mut poller = AccountPoller::new(h.ctx.clone(), &discovery);

        poller.discover().await.unwrap();

        assert_eq!(
            h.feed.calls()[0].kind,
            crate::impls::FeedCallKind::Recent {
                channel: "Local".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_failure_stops_poller_but_not_watchers() {
        let feed = ScriptedFeed::new()
            .with_round(["p1"])
            .with_round_failure("connection reset")
            .with_responses(
                "p1",
                [hot("p1"), ScriptedResponse::Rejected("post_deleted".into())],
            );
        let h = harness(feed);
        let poller = AccountPoller::new(h.ctx.clone(), &settings());

        let err = poller.run().await.unwrap_err();
        assert!(matches!(err, WatchError::Feed(FeedError::Transport(_))));
        assert_eq!(h.feed.recent_calls(), 2);

        // p1 is still in its first backoff sleep.
        assert_eq!(h.registry.state_of(&PostId::new("p1")), Some(WatchState::Running));
        tokio::time::sleep(Duration::from_secs(700)).await;
        assert_eq!(h.registry.state_of(&PostId::new("p1")), Some(WatchState::Done));
        assert_eq!(h.feed.details_calls(&PostId::new("p1")).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_pauses_within_configured_interval() {
        let feed = ScriptedFeed::new()
            .with_round(Vec::<PostId>::new())
            .with_round(Vec::<PostId>::new())
            .with_round_failure("stop");
        let h = harness(feed);
        let poller = AccountPoller::new(h.ctx.clone(), &settings());

        let _ = poller.run().await;

        let at: Vec<_> = h.feed.calls().iter().map(|c| c.at).collect();
        assert_eq!(at.len(), 3);
        for pair in at.windows(2) {
            let gap = (pair[1] - pair[0]).as_secs();
            assert!((150..=450).contains(&gap), "gap {gap}");
        }
    }
}
