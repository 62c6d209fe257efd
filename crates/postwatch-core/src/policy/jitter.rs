use std::time::Duration;

use rand::Rng;

/// Uniformly random whole-second delay in `[min_secs, max_secs]`.
///
/// Spreads periodic work of independent accounts so they do not hit the
/// feed in lockstep.
pub fn uniform_delay(min_secs: u64, max_secs: u64) -> Duration {
    if min_secs >= max_secs {
        return Duration::from_secs(min_secs);
    }
    Duration::from_secs(rand::thread_rng().gen_range(min_secs..=max_secs))
}
