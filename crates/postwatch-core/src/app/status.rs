//! Status - per-account counters for periodic reporting.

use serde::Serialize;
use tracing::info;

use crate::domain::AccountName;
use crate::registry::{WatcherRegistry, WatcherStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStatus {
    pub account: AccountName,
    #[serde(flatten)]
    pub stats: WatcherStats,
}

impl AccountStatus {
    pub fn of(registry: &WatcherRegistry) -> Self {
        Self {
            account: registry.account().clone(),
            stats: registry.stats(),
        }
    }
}

/// Sum of all accounts' counters.
pub fn totals(statuses: &[AccountStatus]) -> WatcherStats {
    statuses.iter().fold(WatcherStats::default(), |acc, s| WatcherStats {
        pending: acc.pending + s.stats.pending,
        running: acc.running + s.stats.running,
        done: acc.done + s.stats.done,
        requests: acc.requests + s.stats.requests,
    })
}

pub fn log_stats(statuses: &[AccountStatus]) {
    for status in statuses {
        info!(
            account = %status.account,
            pending = status.stats.pending,
            running = status.stats.running,
            done = status.stats.done,
            requests = status.stats.requests,
            "watcher stats"
        );
    }
    let total = totals(statuses);
    info!(
        accounts = statuses.len(),
        active = total.active(),
        running = total.running,
        done = total.done,
        requests = total.requests,
        "watcher stats total"
    );
}
