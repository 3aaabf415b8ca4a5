//! # Event Subscriber
//!
//! Subscription handles, the scope that revokes them together, and a
//! `Stream` adapter.

use crate::events::{CrossChainEvent, EventFilter};
use crate::publisher::Registry;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscription was revoked and fully drained.
    #[error("Subscription closed")]
    Closed,
}

/// A subscription handle for receiving events.
///
/// When dropped, the registration is removed from the bus.
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<CrossChainEvent>,
    filter: EventFilter,
    registry: Weak<Registry>,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        receiver: mpsc::Receiver<CrossChainEvent>,
        filter: EventFilter,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            receiver,
            filter,
            registry,
        }
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the subscription is revoked and every delivery
    /// already in flight has been drained.
    pub async fn recv(&mut self) -> Option<CrossChainEvent> {
        self.receiver.recv().await
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - Revoked and drained
    pub fn try_recv(&mut self) -> Result<Option<CrossChainEvent>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Stop receiving new events. Already buffered events can still be read.
    pub fn unsubscribe(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
        self.receiver.close();
    }

    /// Registration id on the bus.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Wrap the subscription as a `Stream`.
    #[must_use]
    pub fn into_stream(self) -> EventStream {
        EventStream { subscription: self }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                debug!(subscription = self.id, "Subscription dropped");
            }
        }
    }
}

#[derive(Default)]
struct ScopeInner {
    closed: bool,
    tracked: Vec<(Weak<Registry>, u64)>,
}

/// Groups subscriptions so they can be revoked together.
#[derive(Default)]
pub struct SubscriptionScope {
    inner: Mutex<ScopeInner>,
}

impl SubscriptionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a subscription. A scope that is already closed revokes it on
    /// the spot and hands it back closed.
    #[must_use]
    pub fn track(&self, mut subscription: Subscription) -> Subscription {
        let mut inner = self.inner.lock();
        if inner.closed {
            subscription.unsubscribe();
        } else {
            inner
                .tracked
                .push((subscription.registry.clone(), subscription.id));
        }
        subscription
    }

    /// Revoke every tracked subscription. Calling it again is a no-op.
    ///
    /// Returns the number of registrations revoked.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        if inner.closed {
            return 0;
        }
        inner.closed = true;

        let revoked = inner
            .tracked
            .drain(..)
            .filter_map(|(registry, id)| registry.upgrade().map(|r| r.remove_all([id])))
            .sum();
        debug!(revoked, "Subscription scope closed");
        revoked
    }

    /// Number of tracked subscriptions still registered.
    #[must_use]
    pub fn count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .tracked
            .iter()
            .filter(|(registry, id)| registry.upgrade().is_some_and(|r| r.contains(*id)))
            .count()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.subscription.filter()
    }
}

impl Stream for EventStream {
    type Item = CrossChainEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().subscription.receiver.poll_recv(cx)
    }
}
