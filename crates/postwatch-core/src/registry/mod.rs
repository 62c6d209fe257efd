//! Per-account watch registry: dedup and lifecycle bookkeeping.
//!
//! One registry per account. It is the only state shared between that
//! account's poller and its watchers, and it guarantees that at most one
//! watcher is ever active for a given post id.

mod guard;
mod stats;

pub use guard::WatchGuard;
pub use stats::WatcherStats;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::domain::{AccountName, PostId, WatchState};
use crate::error::RegistryError;

struct RegistryState {
    entries: HashMap<PostId, WatchState>,

    /// Finished ids in completion order; only kept when `done_capacity` is set.
    done_order: VecDeque<PostId>,
    done_capacity: Option<usize>,

    pending: usize,
    running: usize,
    finished: u64,
}

impl RegistryState {
    fn new(done_capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            done_order: VecDeque::new(),
            done_capacity,
            pending: 0,
            running: 0,
            finished: 0,
        }
    }

    fn insert_if_absent(&mut self, post_id: &PostId, state: WatchState) -> bool {
        if self.entries.contains_key(post_id) {
            return false;
        }
        self.entries.insert(post_id.clone(), state);
        match state {
            WatchState::Pending => self.pending += 1,
            WatchState::Running => self.running += 1,
            WatchState::Done => {}
        }
        true
    }

    fn transition(
        &mut self,
        post_id: &PostId,
        from: WatchState,
        to: WatchState,
    ) -> Result<(), RegistryError> {
        match self.entries.get_mut(post_id) {
            Some(state) if *state == from => *state = to,
            other => {
                return Err(RegistryError::InvalidTransition {
                    post_id: post_id.clone(),
                    from: other.copied(),
                    to,
                });
            }
        }
        match from {
            WatchState::Pending => self.pending -= 1,
            WatchState::Running => self.running -= 1,
            WatchState::Done => {}
        }
        match to {
            WatchState::Pending => self.pending += 1,
            WatchState::Running => self.running += 1,
            WatchState::Done => {
                self.finished += 1;
                self.remember_done(post_id);
            }
        }
        Ok(())
    }

    fn remember_done(&mut self, post_id: &PostId) {
        let Some(capacity) = self.done_capacity else {
            return;
        };
        self.done_order.push_back(post_id.clone());
        while self.done_order.len() > capacity {
            if let Some(evicted) = self.done_order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }
}

/// Dedup and lifecycle bookkeeping for one account.
///
/// All check-and-set operations run under a short synchronous lock that is
/// never held across an `.await`.
pub struct WatcherRegistry {
    account: AccountName,
    state: Mutex<RegistryState>,
    requests: AtomicU64,
}

impl WatcherRegistry {
    /// Registry that remembers every finished id for its whole lifetime.
    pub fn new(account: AccountName) -> Self {
        Self::build(account, None)
    }

    /// Registry that forgets the oldest finished ids beyond `capacity`.
    ///
    /// A forgotten id is unknown again: if discovery still returns it, it is
    /// watched a second time, the same as after a restart.
    pub fn with_done_capacity(account: AccountName, capacity: usize) -> Self {
        Self::build(account, Some(capacity))
    }

    fn build(account: AccountName, done_capacity: Option<usize>) -> Self {
        Self {
            account,
            state: Mutex::new(RegistryState::new(done_capacity)),
            requests: AtomicU64::new(0),
        }
    }

    pub fn account(&self) -> &AccountName {
        &self.account
    }

    pub fn state_of(&self, post_id: &PostId) -> Option<WatchState> {
        self.state.lock().entries.get(post_id).copied()
    }

    /// Mark `post_id` Running unless it is already known in any state.
    ///
    /// Returns `true` at most once per id over the registry's lifetime.
    pub fn try_start(&self, post_id: &PostId) -> bool {
        self.state.lock().insert_if_absent(post_id, WatchState::Running)
    }

    /// Running -> Done.
    pub fn finish(&self, post_id: &PostId) -> Result<(), RegistryError> {
        self.state
            .lock()
            .transition(post_id, WatchState::Running, WatchState::Done)
    }

    /// Admit `post_id` as Pending and hand out the guard that owns its watch.
    ///
    /// Returns `None` if the id is already Pending, Running or Done.
    pub fn claim(self: &Arc<Self>, post_id: PostId) -> Option<WatchGuard> {
        if !self.state.lock().insert_if_absent(&post_id, WatchState::Pending) {
            return None;
        }
        Some(WatchGuard::new(Arc::clone(self), post_id))
    }

    /// Pending -> Running.
    pub(crate) fn begin(&self, post_id: &PostId) -> Result<(), RegistryError> {
        self.state
            .lock()
            .transition(post_id, WatchState::Pending, WatchState::Running)
    }

    /// Drop a Pending entry whose watcher never started.
    pub(crate) fn abandon(&self, post_id: &PostId) {
        let mut state = self.state.lock();
        if state.entries.get(post_id) == Some(&WatchState::Pending) {
            state.entries.remove(post_id);
            state.pending -= 1;
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> WatcherStats {
        let state = self.state.lock();
        WatcherStats {
            pending: state.pending,
            running: state.running,
            done: state.finished,
            requests: self.requests.load(Ordering::Relaxed),
        }
    }
}
