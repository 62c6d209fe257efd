//! Persisted documents: the state of a post or reply at the time it was polled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PostId;
use crate::ports::feed_client::{PostDetails, ReplyDetails};

/// Words of `message` that start with `#`, without the leading `#`s.
pub fn extract_tags(message: &str) -> Vec<String> {
    message
        .split_whitespace()
        .filter(|word| word.starts_with('#'))
        .map(|word| word.trim_matches('#').to_string())
        .collect()
}

/// A post as last observed. Overwritten by id on every successful poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub id: PostId,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub from_home: Option<bool>,
    pub color: String,
    pub distance: u32,
    pub location_name: String,
    pub vote_count: i64,
    pub child_count: u32,
    pub pin_count: u32,
    pub share_count: u32,
    pub banned: bool,
    pub deleted: bool,
    pub readonly: bool,
    pub polarity: f64,
}

impl PostSnapshot {
    pub fn from_details(details: &PostDetails, banned: bool, readonly: bool, polarity: f64) -> Self {
        Self {
            id: details.post_id.clone(),
            timestamp: details.created_at,
            message: details.message.clone(),
            tags: extract_tags(&details.message),
            image_url: details.image_url.clone(),
            thumbnail_url: details.thumbnail_url.clone(),
            from_home: details.from_home,
            color: details.color.clone(),
            distance: details.distance,
            location_name: details.location.name.clone(),
            vote_count: details.vote_count,
            child_count: details.child_count,
            pin_count: details.pin_count,
            share_count: details.share_count,
            banned,
            deleted: false,
            readonly,
            polarity,
        }
    }

    /// Engagement used by the hotness score.
    pub fn points(&self) -> i64 {
        self.vote_count + i64::from(self.child_count)
    }

    /// Age in hours at `now`, never negative.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.timestamp).num_milliseconds() as f64 / 1000.0;
        (seconds / 3600.0).max(0.0)
    }
}

/// A reply, with a copy of the parent post fields that analysis groups by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    pub id: PostId,
    pub post_id: PostId,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub tags: Vec<String>,
    pub color: String,
    pub distance: u32,
    pub got_thanks: bool,
    pub location_name: String,
    pub from_home: Option<bool>,
    pub vote_count: i64,
    pub replier: u32,
    pub polarity: f64,

    pub post_timestamp: DateTime<Utc>,
    pub post_message: String,
    pub post_tags: Vec<String>,
    pub post_color: String,
    pub post_vote_count: i64,
    pub post_pin_count: u32,
    pub post_share_count: u32,
    pub post_polarity: f64,
}

impl ReplySnapshot {
    pub fn from_details(reply: &ReplyDetails, post: &PostSnapshot, polarity: f64) -> Self {
        Self {
            id: reply.post_id.clone(),
            post_id: reply.parent_id.clone(),
            timestamp: reply.created_at,
            message: reply.message.clone(),
            tags: extract_tags(&reply.message),
            color: reply.color.clone(),
            distance: reply.distance,
            got_thanks: reply.got_thanks,
            location_name: reply.location.name.clone(),
            from_home: reply.from_home,
            vote_count: reply.vote_count,
            replier: reply.replier,
            polarity,
            post_timestamp: post.timestamp,
            post_message: post.message.clone(),
            post_tags: post.tags.clone(),
            post_color: post.color.clone(),
            post_vote_count: post.vote_count,
            post_pin_count: post.pin_count,
            post_share_count: post.share_count,
            post_polarity: post.polarity,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{post_details, reply_details};
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn tags_are_hash_words_without_hash() {
        assert_eq!(
            extract_tags("off to #work ##monday see#you #"),
            vec!["work".to_string(), "monday".to_string(), String::new()]
        );
        assert!(extract_tags("no tags here").is_empty());
    }

    #[test]
    fn post_snapshot_copies_counters_and_flags() {
        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let mut details = post_details("p1", created, 7);
        details.child_count = 3;

        let snapshot = PostSnapshot::from_details(&details, true, false, 0.25);

        assert_eq!(snapshot.id, PostId::new("p1"));
        assert_eq!(snapshot.tags, vec!["berlin", "nacht"]);
        assert_eq!(snapshot.location_name, "Berlin");
        assert_eq!(snapshot.points(), 10);
        assert!(snapshot.banned);
        assert!(!snapshot.deleted);
        assert_eq!(snapshot.polarity, 0.25);
    }

    #[test]
    fn age_is_measured_in_hours_and_clamped() {
        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let snapshot = PostSnapshot::from_details(&post_details("p1", created, 0), false, false, 0.0);

        assert_eq!(snapshot.age_hours(created + Duration::minutes(90)), 1.5);
        assert_eq!(snapshot.age_hours(created - Duration::hours(1)), 0.0);
    }

    #[test]
    fn reply_snapshot_denormalizes_parent() {
        let created = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        let post = PostSnapshot::from_details(&post_details("p1", created, 5), false, false, -0.5);
        let reply = reply_details("r1", "p1", created + Duration::minutes(5));

        let snapshot = ReplySnapshot::from_details(&reply, &post, 0.1);

        assert_eq!(snapshot.id, PostId::new("r1"));
        assert_eq!(snapshot.post_id, PostId::new("p1"));
        assert_eq!(snapshot.tags, vec!["nacht"]);
        assert_eq!(snapshot.post_timestamp, created);
        assert_eq!(snapshot.post_vote_count, 5);
        assert_eq!(snapshot.post_polarity, -0.5);
    }
}
