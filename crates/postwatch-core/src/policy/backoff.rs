//! Backoff policy: how long a watcher sleeps between polls.

use std::time::Duration;

/// Exponential backoff between polls of the same post.
///
/// There is no cap and no jitter: a post that stays hot long enough is
/// polled at 10min, 20min, 40min, ... so a post's lifetime costs roughly
/// O(log(lifetime)) requests.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Sleep after the first poll.
    pub initial_delay: Duration,

    /// Growth factor applied after every non-terminating poll.
    pub multiplier: f64,
}

impl BackoffPolicy {
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            multiplier: 2.0,
        }
    }

    /// Delay after the `polls`-th poll (1-indexed).
    ///
    /// delay = initial_delay * multiplier^(polls - 1), saturating at `Duration::MAX`.
    pub fn next_delay(&self, polls: u32) -> Duration {
        let exponent = i32::try_from(polls.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Per-watcher iterator over successive delays.
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: self.clone(),
            polls: 0,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

/// Running backoff state of one watcher.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    polls: u32,
}

impl Backoff {
    /// Delay to sleep now; the following call returns the next, larger one.
    pub fn next_delay(&mut self) -> Duration {
        self.polls = self.polls.saturating_add(1);
        self.policy.next_delay(self.polls)
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_starts_at_ten_minutes() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(600));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[test]
    fn delays_double_from_initial() {
        let mut backoff = BackoffPolicy::default().start();

        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_secs()).collect();

        assert_eq!(delays, vec![600, 1200, 2400, 4800, 9600]);
        assert_eq!(backoff.polls(), 5);
    }

    #[test]
    fn huge_exponent_saturates_instead_of_panicking() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_delay(10_000), Duration::MAX);
    }
}
