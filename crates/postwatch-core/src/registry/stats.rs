use serde::{Deserialize, Serialize};

/// Live counters of one account's registry.
///
/// Process-lifetime values; they reset only on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherStats {
    /// Admitted by discovery, watcher not started yet.
    pub pending: usize,
    /// Watchers currently polling.
    pub running: usize,
    /// Watches that ended, for any reason.
    pub done: u64,
    /// Feed detail requests issued by this account's watchers.
    pub requests: u64,
}

impl WatcherStats {
    pub fn active(&self) -> usize {
        self.pending + self.running
    }
}
