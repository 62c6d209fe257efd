//! postwatch-core
//!
//! Watches posts of a social feed over their whole lifetime and records every
//! observed state.
//!
//! # Modules
//! - **domain**: ids, watch state, termination reasons, snapshots, buckets
//! - **ports**: FeedClient, DocumentStore, SentimentScorer, Clock
//! - **registry**: per-account dedup and lifecycle bookkeeping
//! - **policy**: hotness decay, poll backoff, discovery jitter
//! - **app**: PostWatcher, AccountPoller, Orchestrator
//! - **impls**: in-memory and file stores, scripted feed
//! - **config**: TOML settings

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod policy;
pub mod ports;
pub mod registry;

pub use app::{Orchestrator, OrchestratorBuilder};
pub use config::Settings;
pub use error::{ConfigError, FeedError, RegistryError, StoreError, WatchError};
