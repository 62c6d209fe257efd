//! Polling policies: when to poll a post again, when to give up on it, and
//! how to spread periodic work.

pub mod backoff;
pub mod hotness;
pub mod jitter;

pub use backoff::{Backoff, BackoffPolicy};
pub use hotness::{HotnessPolicy, Verdict};
pub use jitter::uniform_delay;
