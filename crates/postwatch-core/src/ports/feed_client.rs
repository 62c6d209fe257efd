//! FeedClient port - the social feed we observe.
//!
//! Authentication, request signing and transport live behind this trait.
//! The wire shapes below follow the feed's JSON so fixtures and real clients
//! can decode straight into them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PostId;
use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
}

/// Post payload of a details response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetails {
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub from_home: Option<bool>,
    pub color: String,
    pub distance: u32,
    pub location: Location,
    pub vote_count: i64,
    pub child_count: u32,
    pub pin_count: u32,
    pub share_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyDetails {
    pub post_id: PostId,
    pub parent_id: PostId,
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub color: String,
    pub distance: u32,
    #[serde(default)]
    pub got_thanks: bool,
    pub location: Location,
    #[serde(default)]
    pub from_home: Option<bool>,
    pub vote_count: i64,
    /// Per-thread index of the replying user.
    #[serde(default)]
    pub replier: u32,
}

/// One page of a details response.
///
/// The first page carries `details`; follow-up pages fetched with a cursor
/// only matter for their `replies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsPage {
    #[serde(default)]
    pub details: Option<PostDetails>,
    #[serde(default)]
    pub replies: Vec<ReplyDetails>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub readonly: bool,
}

impl DetailsPage {
    /// Cursor for the following page, if any. An empty cursor ends pagination.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

/// Classified refusal: the feed answered, but without a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRejection {
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    Blocked,
    Deleted,
    Other,
}

impl FeedRejection {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn kind(&self) -> RejectionKind {
        match self.error.as_str() {
            "post_blocked" => RejectionKind::Blocked,
            "post_deleted" => RejectionKind::Deleted,
            _ => RejectionKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailsResponse {
    // Must stay first: an untagged page with only defaults would match anything.
    Rejected(FeedRejection),
    Page(DetailsPage),
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Ids of the most recent posts in `channel`. Consecutive calls may overlap.
    async fn recent(&self, channel: &str) -> Result<Vec<PostId>, FeedError>;

    /// Details and one page of replies for `post_id`.
    async fn details(
        &self,
        post_id: &PostId,
        cursor: Option<&str>,
    ) -> Result<DetailsResponse, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::blocked("post_blocked", RejectionKind::Blocked)]
    #[case::deleted("post_deleted", RejectionKind::Deleted)]
    #[case::other("post_not_found", RejectionKind::Other)]
    fn rejection_is_classified(#[case] error: &str, #[case] expected: RejectionKind) {
        assert_eq!(FeedRejection::new(error).kind(), expected);
    }

    #[test]
    fn error_body_decodes_as_rejection() {
        let resp: DetailsResponse =
            serde_json::from_value(serde_json::json!({ "error": "post_deleted" })).unwrap();
        assert_eq!(resp, DetailsResponse::Rejected(FeedRejection::new("post_deleted")));
    }

    #[test]
    fn page_body_decodes_with_defaults() {
        let resp: DetailsResponse = serde_json::from_value(serde_json::json!({
            "details": {
                "post_id": "p1",
                "created_at": "2019-03-01T10:00:00.000Z",
                "message": "hello #world",
                "color": "FF9908",
                "distance": 2,
                "location": { "name": "Berlin" },
                "vote_count": 4,
                "child_count": 1,
                "pin_count": 0,
                "share_count": 0
            },
            "replies": [],
            "next": null
        }))
        .unwrap();

        let DetailsResponse::Page(page) = resp else {
            panic!("expected a page");
        };
        assert_eq!(page.details.as_ref().unwrap().post_id, PostId::new("p1"));
        assert!(!page.banned);
        assert_eq!(page.next_cursor(), None);
    }

    #[rstest]
    #[case::missing(None, None)]
    #[case::empty(Some(""), None)]
    #[case::present(Some("abc"), Some("abc"))]
    fn next_cursor_ignores_empty(#[case] next: Option<&str>, #[case] expected: Option<&str>) {
        let page = DetailsPage {
            next: next.map(str::to_string),
            ..DetailsPage::default()
        };
        assert_eq!(page.next_cursor(), expected);
    }
}
