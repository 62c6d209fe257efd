use std::sync::Arc;

use tracing::error;

use super::WatcherRegistry;
use crate::domain::PostId;
use crate::error::RegistryError;

/// Ownership of one post's watch.
///
/// Created Pending by [`WatcherRegistry::claim`]. `begin` moves it to
/// Running. Dropping the guard ends the watch on every exit path, including
/// errors, panics and task aborts:
/// - Running -> Done (the registry's `finish`, exactly once)
/// - Pending -> forgotten, so a watcher that never started leaves no trace
pub struct WatchGuard {
    registry: Arc<WatcherRegistry>,
    post_id: PostId,
    started: bool,
}

impl WatchGuard {
    pub(super) fn new(registry: Arc<WatcherRegistry>, post_id: PostId) -> Self {
        Self {
            registry,
            post_id,
            started: false,
        }
    }

    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    /// Pending -> Running. Idempotent once started.
    pub fn begin(&mut self) -> Result<(), RegistryError> {
        if !self.started {
            self.registry.begin(&self.post_id)?;
            self.started = true;
        }
        Ok(())
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if !self.started {
            self.registry.abandon(&self.post_id);
            return;
        }
        if let Err(err) = self.registry.finish(&self.post_id) {
            error!(
                account = %self.registry.account(),
                post_id = %self.post_id,
                error = %err,
                "watch guard could not finish"
            );
        }
    }
}
