//! Single-flight access-token refresh.
//!
//! DESIGN
//! ======
//! Any number of requests can hit a 401 at the same time. The first one to
//! find the slot empty installs a shared future and becomes the leader; the
//! rest clone that future and wait on the same result. The slot is checked
//! and filled inside one mutex section with no await in between, so the
//! guarantee holds on a multi-threaded runtime too.
//!
//! Each refresh gets an episode number. Callers that fail after the same
//! episode claim it through [`RefreshCoordinator::claim_expiry`], so only one
//! of them reports session loss. Episodes are per coordinator; the marker
//! lives here rather than in the shared broadcaster so clients sharing one
//! broadcaster never suppress each other.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Result of one refresh episode, shared by every caller that waited on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub episode: u64,
    /// New access token, or `None` when the session could not be renewed.
    pub access_token: Option<String>,
}

#[derive(Clone, Default)]
pub struct RefreshCoordinator {
    inner: Arc<RefreshInner>,
}

#[derive(Default)]
struct RefreshInner {
    in_flight: Mutex<Option<(u64, SharedRefresh)>>,
    last_episode: AtomicU64,
    last_expired: AtomicU64,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of refresh episodes started so far.
    #[must_use]
    pub fn episodes(&self) -> u64 {
        self.inner.last_episode.load(Ordering::SeqCst)
    }

    /// `true` for the first caller to report session loss after `episode`;
    /// later callers for the same or an older episode get `false`.
    #[must_use]
    pub fn claim_expiry(&self, episode: u64) -> bool {
        self.inner.last_expired.fetch_max(episode, Ordering::SeqCst) < episode
    }

    /// Join the refresh in flight, or start one by calling `start`.
    ///
    /// `start` is only invoked by the leader. Its future must resolve to the
    /// new access token, or `None` on any failure.
    pub async fn run<F, Fut>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let shared = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some((episode, existing)) = slot.as_ref() {
                tracing::debug!(episode, "joining token refresh in flight");
                existing.clone()
            } else {
                let episode = self.inner.last_episode.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(episode, "starting token refresh");
                let refresh = start();
                let inner = Arc::clone(&self.inner);
                let shared = async move {
                    let access_token = refresh.await;
                    inner.finish(episode);
                    RefreshOutcome { episode, access_token }
                }
                .boxed()
                .shared();
                *slot = Some((episode, shared.clone()));
                shared
            }
        };
        shared.await
    }
}

impl RefreshInner {
    /// Empty the slot so the next 401 starts a fresh episode.
    fn finish(&self, episode: u64) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(current, _)| *current == episode) {
            *slot = None;
        }
    }
}
