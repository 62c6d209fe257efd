//! Impls - bundled collaborator implementations.
//!
//! # Included
//! - **InMemoryDocumentStore**: bucketed maps, for tests and dry runs
//! - **FileDocumentStore**: one JSON file per document
//! - **ScriptedFeed**: replays a fixture instead of the live feed
//!
//! The live feed client is provided by the embedding application.

pub mod file_store;
pub mod inmem_store;
pub mod scripted_feed;

pub use self::file_store::FileDocumentStore;
pub use self::inmem_store::InMemoryDocumentStore;
pub use self::scripted_feed::{
    DiscoveryRound, FeedCall, FeedCallKind, FeedScript, ScriptedFeed, ScriptedResponse,
};
