//! Process-wide session-expired notifications.
//!
//! ARCHITECTURE
//! ============
//! A 401 that cannot be recovered can surface from any request in flight, so
//! session loss is published on a multi-subscriber channel instead of being
//! returned to one call site. Every subscriber gets its own receiver and can
//! react independently.
//!
//! Collapsing the many failures of one refresh episode into a single
//! notification is the client's job (see `net::refresh`); this channel
//! delivers whatever it is given.

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials are gone; listeners should treat the user as signed out.
    Expired,
}

#[derive(Clone)]
pub struct SessionBroadcaster {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish session loss to every subscriber. Returns how many received it.
    pub fn notify_expired(&self) -> usize {
        // No subscribers is a valid state (nothing mounted yet).
        let receivers = self.tx.send(SessionEvent::Expired).unwrap_or(0);
        tracing::info!(receivers, "session expired");
        receivers
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
