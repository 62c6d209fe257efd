use thiserror::Error;

use crate::domain::{PostId, WatchState};

/// Failure talking to the feed that is not a classified rejection.
///
/// Classified rejections (`post_blocked`, `post_deleted`, ...) are not errors;
/// they arrive as `DetailsResponse::Rejected` and end a watch normally.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed transport failed: {0}")]
    Transport(String),

    #[error("feed response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("post_id={post_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        post_id: PostId,
        from: Option<WatchState>,
        to: WatchState,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Anything that ends a watcher or a poller abnormally.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
