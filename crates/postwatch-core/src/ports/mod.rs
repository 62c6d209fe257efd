//! Ports - the collaborators the watch core talks to.
//!
//! Each trait hides an external system (the feed API, the document store,
//! the sentiment model, the wall clock). Implementations live in `impls` or
//! in the embedding application.

pub mod clock;
pub mod document_store;
pub mod feed_client;
pub mod sentiment;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::document_store::DocumentStore;
pub use self::feed_client::{
    DetailsPage, DetailsResponse, FeedClient, FeedRejection, Location, PostDetails,
    RejectionKind, ReplyDetails,
};
pub use self::sentiment::{NeutralSentiment, SentimentScorer};
