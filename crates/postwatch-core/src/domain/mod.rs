//! Domain model (ids, lifecycle states, snapshots, document buckets).

pub mod bucket;
pub mod ids;
pub mod snapshot;
pub mod state;

pub use bucket::{DocumentKind, bucket_name, normalize_location};
pub use ids::{AccountName, PostId};
pub use snapshot::{PostSnapshot, ReplySnapshot, extract_tags};
pub use state::{Termination, WatchState};
