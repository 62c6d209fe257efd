//! OrchestratorBuilder - wiring and start-up validation.
//!
//! Collaborators are shared by every account; each account brings its own
//! feed client and gets its own registry. `build` fails fast on wiring
//! mistakes instead of letting a poller discover them later.

use std::collections::HashSet;
use std::sync::Arc;

use super::orchestrator::Orchestrator;
use super::watcher::WatchContext;
use crate::config::{DiscoverySettings, Settings, WatchSettings};
use crate::domain::AccountName;
use crate::ports::{Clock, DocumentStore, FeedClient, NeutralSentiment, SentimentScorer, SystemClock};
use crate::registry::WatcherRegistry;

/// # Example
/// ```ignore
/// let orchestrator = OrchestratorBuilder::from_settings(&settings)
///     .store(Arc::new(InMemoryDocumentStore::new()))
///     .account("Berlin", berlin_feed)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    discovery: DiscoverySettings,
    watch: WatchSettings,
    store: Option<Arc<dyn DocumentStore>>,
    sentiment: Arc<dyn SentimentScorer>,
    clock: Arc<dyn Clock>,
    accounts: Vec<(AccountName, Arc<dyn FeedClient>)>,
    expected_accounts: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no document store configured")]
    MissingStore,

    #[error("no accounts registered")]
    NoAccounts,

    #[error("account {0:?} registered twice")]
    DuplicateAccount(String),

    #[error("missing accounts: {0:?}. These accounts were expected but have no feed client.")]
    MissingAccounts(Vec<String>),
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            discovery: DiscoverySettings::default(),
            watch: WatchSettings::default(),
            store: None,
            sentiment: Arc::new(NeutralSentiment),
            clock: Arc::new(SystemClock),
            accounts: Vec::new(),
            expected_accounts: None,
        }
    }

    /// Takes discovery and watch tuning from `settings` and expects a feed
    /// client for every configured account.
    pub fn from_settings(settings: &Settings) -> Self {
        let locations: Vec<&str> = settings.accounts.iter().map(|a| a.location.as_str()).collect();
        Self::new()
            .discovery(settings.discovery.clone())
            .watch(settings.watch.clone())
            .expect_accounts(&locations)
    }

    pub fn discovery(mut self, discovery: DiscoverySettings) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn watch(mut self, watch: WatchSettings) -> Self {
        self.watch = watch;
        self
    }

    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sentiment(mut self, sentiment: Arc<dyn SentimentScorer>) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an account. Accounts are started in registration order.
    pub fn account(mut self, name: impl Into<String>, feed: Arc<dyn FeedClient>) -> Self {
        self.accounts.push((AccountName::new(name), feed));
        self
    }

    pub fn expect_accounts(mut self, names: &[&str]) -> Self {
        self.expected_accounts = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<Orchestrator, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;

        if let Some(expected) = &self.expected_accounts {
            let registered: HashSet<&str> =
                self.accounts.iter().map(|(name, _)| name.as_str()).collect();
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !registered.contains(name.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingAccounts(missing));
            }
        }
        if self.accounts.is_empty() {
            return Err(BuildError::NoAccounts);
        }

        let mut seen = HashSet::new();
        let mut contexts = Vec::with_capacity(self.accounts.len());
        for (name, feed) in self.accounts {
            if !seen.insert(name.clone()) {
                return Err(BuildError::DuplicateAccount(name.as_str().to_string()));
            }
            let registry = match self.watch.done_capacity {
                Some(capacity) => WatcherRegistry::with_done_capacity(name, capacity),
                None => WatcherRegistry::new(name),
            };
            contexts.push(WatchContext {
                registry: Arc::new(registry),
                feed,
                store: Arc::clone(&store),
                sentiment: Arc::clone(&self.sentiment),
                clock: Arc::clone(&self.clock),
                hotness: self.watch.hotness(),
                backoff: self.watch.backoff(),
            });
        }
        Ok(Orchestrator::new(contexts, self.discovery))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryDocumentStore, ScriptedFeed};

    fn feed() -> Arc<dyn FeedClient> {
        Arc::new(ScriptedFeed::new())
    }

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    #[test]
    fn build_success_keeps_account_order() {
        let orchestrator = OrchestratorBuilder::new()
            .store(store())
            .account("Berlin", feed())
            .account("Köln", feed())
            .expect_accounts(&["Köln", "Berlin"])
            .build()
            .unwrap();

        let names: Vec<_> = orchestrator
            .registries()
            .iter()
            .map(|r| r.account().as_str().to_string())
            .collect();
        assert_eq!(names, vec!["Berlin", "Köln"]);
    }

    #[test]
    fn build_without_store_fails() {
        let result = OrchestratorBuilder::new().account("Berlin", feed()).build();
        assert!(matches!(result, Err(BuildError::MissingStore)));
    }

    #[test]
    fn build_without_accounts_fails() {
        let result = OrchestratorBuilder::new().store(store()).build();
        assert!(matches!(result, Err(BuildError::NoAccounts)));
    }

    #[test]
    fn build_with_duplicate_account_fails() {
        let result = OrchestratorBuilder::new()
            .store(store())
            .account("Berlin", feed())
            .account("Berlin", feed())
            .build();
        assert!(matches!(result, Err(BuildError::DuplicateAccount(name)) if name == "Berlin"));
    }

    #[test]
    fn build_missing_expected_accounts() {
        let settings = Settings::from_toml(
            "[[accounts]]\nlocation = \"Berlin\"\n[[accounts]]\nlocation = \"Köln\"",
        )
        .unwrap();

        let result = OrchestratorBuilder::from_settings(&settings)
            .store(store())
            .account("Berlin", feed())
            .build();

        assert!(matches!(
            result,
            Err(BuildError::MissingAccounts(missing)) if missing == vec!["Köln".to_string()]
        ));
    }
}
