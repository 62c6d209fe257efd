//! Destination naming for stored documents.
//!
//! Documents are partitioned by kind, location and the day they were created:
//! `post-berlin-20190301`. A document's creation time never changes, so an id
//! always routes to the same bucket and upserts stay idempotent.

use chrono::{DateTime, Utc};

use super::{PostSnapshot, ReplySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Post,
    Reply,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Post => "post",
            DocumentKind::Reply => "reply",
        }
    }
}

/// Lower-case, transliterate umlauts and make `location` safe for a bucket name.
pub fn normalize_location(location: &str) -> String {
    let mut out = String::with_capacity(location.len());
    for c in location.to_lowercase().chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'ß' => out.push_str("ss"),
            '/' | ' ' => out.push('_'),
            other => out.push(other),
        }
    }
    out
}

pub fn bucket_name(kind: DocumentKind, location: &str, created_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        kind.as_str(),
        normalize_location(location),
        created_at.format("%Y%m%d")
    )
}

impl PostSnapshot {
    pub fn bucket(&self) -> String {
        bucket_name(DocumentKind::Post, &self.location_name, self.timestamp)
    }
}

impl ReplySnapshot {
    pub fn bucket(&self) -> String {
        bucket_name(DocumentKind::Reply, &self.location_name, self.timestamp)
    }
}
