//! # Event Publisher
//!
//! Topic-filtered observer registry. Each publish hands every matching
//! subscription a spawned delivery task; a task waits for the previous
//! delivery to the same subscription before sending, so one consumer sees
//! events in publish order while a slow consumer never holds up the caller.

use crate::events::{CrossChainEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Trait for publishing events to the bus.
pub trait EventPublisher: Send + Sync {
    /// Publish an event without waiting for delivery.
    ///
    /// Returns the number of subscriptions the event was dispatched to.
    fn publish(&self, event: CrossChainEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// One registered consumer.
struct Slot {
    filter: EventFilter,
    sender: mpsc::Sender<CrossChainEvent>,
    /// Latest delivery task; the next one chains after it.
    last_delivery: Option<JoinHandle<()>>,
}

/// Registrations shared between the bus and its subscription handles.
#[derive(Default)]
pub(crate) struct Registry {
    slots: Mutex<HashMap<u64, Slot>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Drop one registration. Returns whether it was still present.
    pub(crate) fn remove(&self, id: u64) -> bool {
        self.slots.lock().remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.slots.lock().contains_key(&id)
    }

    /// Drop a set of registrations under a single lock.
    pub(crate) fn remove_all(&self, ids: impl IntoIterator<Item = u64>) -> usize {
        let mut slots = self.slots.lock();
        ids.into_iter()
            .filter(|id| slots.remove(id).is_some())
            .count()
    }
}

/// In-memory implementation of the event bus.
pub struct InMemoryEventBus {
    registry: Arc<Registry>,

    /// Total events published.
    events_published: AtomicU64,

    /// Per-subscription channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// The registration lives until the returned handle is unsubscribed,
    /// dropped, or revoked by a `SubscriptionScope`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);

        self.registry.slots.lock().insert(
            id,
            Slot {
                filter: filter.clone(),
                sender,
                last_delivery: None,
            },
        );

        debug!(subscription = id, topics = ?filter.topics, "New subscription created");

        Subscription::new(id, receiver, filter, Arc::downgrade(&self.registry))
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.subscribe(filter).into_stream()
    }

    /// Get the number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.slots.lock().len()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: CrossChainEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let runtime = Handle::try_current().ok();
        let mut slots = self.registry.slots.lock();
        let mut dispatched = 0;

        for (id, slot) in slots.iter_mut() {
            if !slot.filter.matches(&event) {
                continue;
            }
            dispatched += 1;
            let event = event.clone();

            let Some(runtime) = &runtime else {
                // No executor to hand the send to: deliver what fits now.
                if let Err(e) = slot.sender.try_send(event) {
                    warn!(subscription = id, topic = ?topic, error = %e, "Event dropped (no runtime)");
                }
                continue;
            };

            let previous = slot.last_delivery.take();
            let sender = slot.sender.clone();
            let id = *id;
            slot.last_delivery = Some(runtime.spawn(async move {
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                if sender.send(event).await.is_err() {
                    trace!(subscription = id, "Delivery target gone");
                }
            }));
        }

        if dispatched == 0 {
            trace!(topic = ?topic, "Event dropped (no receivers)");
        } else {
            debug!(topic = ?topic, receivers = dispatched, "Event published");
        }
        dispatched
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
