//! Watch lifecycle states and the reasons a watch ends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one post inside an account's registry.
///
/// State transitions:
/// - Pending -> Running -> Done
///
/// `Done` is absorbing for the lifetime of the registry. A `Pending` entry
/// whose watcher never started is forgotten rather than finished, so the id
/// can be discovered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchState {
    /// Admitted by discovery, watcher not polling yet.
    Pending,

    /// A watcher is polling this post.
    Running,

    /// The watch ended.
    Done,
}

/// Why a watcher stopped polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The feed reports the post as blocked by moderation.
    Banned,

    /// The author deleted the post.
    Deleted,

    /// Any other rejection from the feed.
    OtherGone { error: String },

    /// Engagement decayed below the hotness threshold.
    DecayExpired { hotness: f64 },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Banned => f.write_str("banned"),
            Termination::Deleted => f.write_str("deleted"),
            Termination::OtherGone { error } => write!(f, "gone ({error})"),
            Termination::DecayExpired { hotness } => write!(f, "decay expired ({hotness:.4})"),
        }
    }
}
