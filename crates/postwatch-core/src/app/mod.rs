//! App - watchers, pollers and their wiring.
//!
//! - **PostWatcher**: polls one post until it terminates
//! - **AccountPoller**: discovers posts of one account and spawns watchers
//! - **Orchestrator**: runs one poller per account and reports stats
//! - **OrchestratorBuilder**: wiring and start-up validation

pub mod builder;
pub mod orchestrator;
pub mod poller;
pub mod status;
pub mod watcher;

pub use self::builder::{BuildError, OrchestratorBuilder};
pub use self::orchestrator::Orchestrator;
pub use self::poller::AccountPoller;
pub use self::status::{AccountStatus, log_stats, totals};
pub use self::watcher::{PostWatcher, WatchContext};
