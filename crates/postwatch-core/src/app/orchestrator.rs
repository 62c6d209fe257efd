//! Orchestrator - one poller per account, plus periodic stats.

use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::poller::AccountPoller;
use super::status::{AccountStatus, log_stats};
use super::watcher::WatchContext;
use crate::config::DiscoverySettings;
use crate::domain::AccountName;
use crate::error::WatchError;
use crate::policy::uniform_delay;
use crate::registry::WatcherRegistry;

pub struct Orchestrator {
    accounts: Vec<WatchContext>,
    discovery: DiscoverySettings,
}

impl Orchestrator {
    pub(crate) fn new(accounts: Vec<WatchContext>, discovery: DiscoverySettings) -> Self {
        Self {
            accounts,
            discovery,
        }
    }

    pub fn registries(&self) -> Vec<Arc<WatcherRegistry>> {
        self.accounts
            .iter()
            .map(|ctx| Arc::clone(&ctx.registry))
            .collect()
    }

    pub fn status(&self) -> Vec<AccountStatus> {
        self.accounts
            .iter()
            .map(|ctx| AccountStatus::of(&ctx.registry))
            .collect()
    }

    /// Start the pollers one after another, pausing a random stagger between
    /// consecutive launches, then report stats forever.
    ///
    /// A poller that stops is reported once and never restarted; the others
    /// keep running. Never returns; the caller decides when to drop it.
    pub async fn run(self) {
        let mut pollers = JoinSet::new();
        for (i, ctx) in self.accounts.iter().enumerate() {
            if i > 0 {
                let stagger = uniform_delay(
                    self.discovery.stagger_min_secs,
                    self.discovery.stagger_max_secs,
                );
                debug!(stagger_secs = stagger.as_secs(), "waiting before next poller");
                tokio::time::sleep(stagger).await;
            }
            let account = ctx.account().clone();
            let poller = AccountPoller::new(ctx.clone(), &self.discovery);
            info!(%account, "poller started");
            pollers.spawn(async move {
                let result = poller.run().await;
                (account, result)
            });
        }

        let mut ticker = tokio::time::interval(self.discovery.stats_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                Some(res) = pollers.join_next(), if !pollers.is_empty() => {
                    poller_stopped(res);
                }
                _ = ticker.tick() => {
                    log_stats(&self.status());
                }
            }
        }
    }
}

fn poller_stopped(res: Result<(AccountName, Result<(), WatchError>), JoinError>) {
    match res {
        Ok((account, Err(e))) => {
            error!(%account, error = %e, "poller stopped, not restarting");
        }
        Ok((account, Ok(()))) => {
            error!(%account, "poller ended, not restarting");
        }
        Err(e) => {
            error!(error = %e, "poller task panicked, not restarting");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::OrchestratorBuilder;
    use crate::app::watcher::testkit::stale;
    use crate::domain::{PostId, WatchState};
    use crate::impls::{InMemoryDocumentStore, ScriptedFeed};

    #[tokio::test(start_paused = true)]
    async fn failed_poller_is_not_restarted_and_others_continue() {
        let berlin = Arc::new(
            ScriptedFeed::new()
                .with_round(["b1"])
                .with_round_failure("account blocked")
                .with_responses("b1", [stale("b1")]),
        );
        let koeln = Arc::new(
            ScriptedFeed::new()
                .with_round(["k1"])
                .with_round(["k1", "k2"])
                .with_responses("k1", [stale("k1")])
                .with_responses("k2", [stale("k2")]),
        );
        let store = Arc::new(InMemoryDocumentStore::new());
        let orchestrator = OrchestratorBuilder::new()
            .store(store.clone())
            .account("Berlin", berlin.clone())
            .account("Köln", koeln.clone())
            .build()
            .unwrap();
        let registries = orchestrator.registries();

        let handle = tokio::spawn(orchestrator.run());
        tokio::time::sleep(Duration::from_secs(2_000)).await;

        assert_eq!(berlin.recent_calls(), 2);
        let koeln_calls = koeln.recent_calls();
        assert!(koeln_calls >= 4, "koeln polled {koeln_calls} times");

        tokio::time::sleep(Duration::from_secs(5_000)).await;
        assert_eq!(berlin.recent_calls(), 2, "stopped poller restarted");
        assert!(koeln.recent_calls() > koeln_calls);

        assert_eq!(registries[0].state_of(&PostId::new("b1")), Some(WatchState::Done));
        assert_eq!(registries[1].stats().done, 2);
        assert_eq!(store.post_count(), 3);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn pollers_start_one_after_another() {
        let names = ["Berlin", "Köln", "Hamburg", "München", "Leipzig"];
        let feeds: Vec<_> = names
            .iter()
            .map(|_| Arc::new(ScriptedFeed::new().with_round(Vec::<PostId>::new())))
            .collect();
        let mut builder =
            OrchestratorBuilder::new().store(Arc::new(InMemoryDocumentStore::new()));
        for (name, feed) in names.iter().zip(&feeds) {
            builder = builder.account(*name, feed.clone());
        }
        let orchestrator = builder.build().unwrap();
        let started = tokio::time::Instant::now();

        let handle = tokio::spawn(orchestrator.run());
        // four gaps of at most 20s each, well before any second discovery round
        tokio::time::sleep(Duration::from_secs(100)).await;

        let first_calls: Vec<u64> = feeds
            .iter()
            .map(|feed| {
                let calls = feed.calls();
                assert_eq!(calls.len(), 1);
                (calls[0].at - started).as_secs()
            })
            .collect();
        assert_eq!(first_calls[0], 0, "first poller starts right away");
        for pair in first_calls.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((1..=20).contains(&gap), "start times {first_calls:?}");
        }
        handle.abort();
    }

    #[test]
    fn status_lists_accounts_in_order() {
        let orchestrator = OrchestratorBuilder::new()
            .store(Arc::new(InMemoryDocumentStore::new()))
            .account("Berlin", Arc::new(ScriptedFeed::new()))
            .account("Köln", Arc::new(ScriptedFeed::new()))
            .build()
            .unwrap();

        let status = orchestrator.status();

        assert_eq!(status.len(), 2);
        assert_eq!(status[0].account, AccountName::new("Berlin"));
        assert_eq!(status[1].stats, Default::default());
    }
}
