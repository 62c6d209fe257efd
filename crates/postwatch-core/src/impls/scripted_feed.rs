//! ScriptedFeed - deterministic FeedClient replaying a prepared script.
//!
//! Drives the watcher and poller in tests, and lets the binary run against a
//! JSON fixture instead of the live API:
//!
//! ```json
//! {
//!   "recent": [["p1", "p2"], { "failure": "connection reset" }],
//!   "posts": {
//!     "p1": [{ "page": { "details": { ... }, "replies": [], "next": null } },
//!            { "rejected": "post_deleted" }],
//!     "p2": [{ "transport_failure": "timeout" }]
//!   }
//! }
//! ```
//!
//! Each call consumes the next entry; once a script runs out its last entry
//! repeats. Posts without a script are rejected as `post_not_found`.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::domain::PostId;
use crate::error::FeedError;
use crate::ports::{DetailsPage, DetailsResponse, FeedClient, FeedRejection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscoveryRound {
    Ids(Vec<PostId>),
    Failure { failure: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedResponse {
    Page(DetailsPage),
    Rejected(String),
    TransportFailure(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedScript {
    #[serde(default)]
    pub recent: Vec<DiscoveryRound>,
    #[serde(default)]
    pub posts: HashMap<PostId, Vec<ScriptedResponse>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCallKind {
    Recent { channel: String },
    Details { post_id: PostId, cursor: Option<String> },
}

/// One recorded call, stamped with tokio's (pausable) clock.
#[derive(Debug, Clone)]
pub struct FeedCall {
    pub kind: FeedCallKind,
    pub at: Instant,
}

#[derive(Default)]
struct ScriptState {
    rounds: VecDeque<DiscoveryRound>,
    last_round: Option<DiscoveryRound>,
    posts: HashMap<PostId, VecDeque<ScriptedResponse>>,
    last_response: HashMap<PostId, ScriptedResponse>,
}

fn next_or_repeat<T: Clone>(queue: &mut VecDeque<T>, last: &mut Option<T>) -> Option<T> {
    if let Some(next) = queue.pop_front() {
        *last = Some(next.clone());
        return Some(next);
    }
    last.clone()
}

#[derive(Default)]
pub struct ScriptedFeed {
    state: Mutex<ScriptState>,
    calls: Mutex<Vec<FeedCall>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_script(script: FeedScript) -> Self {
        let mut feed = Self::new();
        for round in script.recent {
            feed = feed.with_round_entry(round);
        }
        for (post_id, responses) in script.posts {
            feed = feed.with_responses(post_id, responses);
        }
        feed
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FeedError::Transport(format!("reading {}: {e}", path.display())))?;
        let script: FeedScript =
            serde_json::from_slice(&bytes).map_err(|e| FeedError::Decode(e.to_string()))?;
        Ok(Self::from_script(script))
    }

    pub fn with_round<I, P>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PostId>,
    {
        self.with_round_entry(DiscoveryRound::Ids(ids.into_iter().map(Into::into).collect()))
    }

    pub fn with_round_failure(self, failure: impl Into<String>) -> Self {
        self.with_round_entry(DiscoveryRound::Failure {
            failure: failure.into(),
        })
    }

    fn with_round_entry(self, round: DiscoveryRound) -> Self {
        self.state.lock().rounds.push_back(round);
        self
    }

    pub fn with_responses(
        self,
        post_id: impl Into<PostId>,
        responses: impl IntoIterator<Item = ScriptedResponse>,
    ) -> Self {
        self.state
            .lock()
            .posts
            .entry(post_id.into())
            .or_default()
            .extend(responses);
        self
    }

    pub fn calls(&self) -> Vec<FeedCall> {
        self.calls.lock().clone()
    }

    pub fn details_calls(&self, post_id: &PostId) -> Vec<FeedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(&call.kind, FeedCallKind::Details { post_id: id, .. } if id == post_id))
            .cloned()
            .collect()
    }

    pub fn recent_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call.kind, FeedCallKind::Recent { .. }))
            .count()
    }

    fn record(&self, kind: FeedCallKind) {
        self.calls.lock().push(FeedCall {
            kind,
            at: Instant::now(),
        });
    }
}

#[async_trait]
impl FeedClient for ScriptedFeed {
    async fn recent(&self, channel: &str) -> Result<Vec<PostId>, FeedError> {
        self.record(FeedCallKind::Recent {
            channel: channel.to_string(),
        });
        let round = {
            let mut state = self.state.lock();
            let ScriptState {
                rounds, last_round, ..
            } = &mut *state;
            next_or_repeat(rounds, last_round)
        };
        match round {
            Some(DiscoveryRound::Ids(ids)) => Ok(ids),
            Some(DiscoveryRound::Failure { failure }) => Err(FeedError::Transport(failure)),
            None => Ok(Vec::new()),
        }
    }

    async fn details(
        &self,
        post_id: &PostId,
        cursor: Option<&str>,
    ) -> Result<DetailsResponse, FeedError> {
        self.record(FeedCallKind::Details {
            post_id: post_id.clone(),
            cursor: cursor.map(str::to_string),
        });
        let response = {
            let mut state = self.state.lock();
            let ScriptState {
                posts,
                last_response,
                ..
            } = &mut *state;
            match posts.get_mut(post_id).and_then(VecDeque::pop_front) {
                Some(next) => {
                    last_response.insert(post_id.clone(), next.clone());
                    Some(next)
                }
                None => last_response.get(post_id).cloned(),
            }
        };
        match response {
            Some(ScriptedResponse::Page(page)) => Ok(DetailsResponse::Page(page)),
            Some(ScriptedResponse::Rejected(error)) => {
                Ok(DetailsResponse::Rejected(FeedRejection::new(error)))
            }
            Some(ScriptedResponse::TransportFailure(message)) => Err(FeedError::Transport(message)),
            None => Ok(DetailsResponse::Rejected(FeedRejection::new("post_not_found"))),
        }
    }
}
