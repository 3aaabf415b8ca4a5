//! # Cross-Chain Events
//!
//! Every event the relay publishes. Immediate events fire as soon as a log
//! is seen; confirmed events fire once the log's block is buried under the
//! confirmation depth and still canonical.

use serde::{Deserialize, Serialize};
use shared_types::{CrossTransaction, CrossTransactionModifier, RemoteChainInfo};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossChainEvent {
    // =========================================================================
    // IMMEDIATE
    // =========================================================================
    /// Taker logs seen in a new block.
    NewTaker {
        takers: Vec<CrossTransactionModifier>,
    },

    /// Finish logs seen in a new block.
    NewFinish {
        finishes: Vec<CrossTransactionModifier>,
    },

    /// Anchor-set membership changed for remote chains.
    AnchorUpdate { chain_info: Vec<RemoteChainInfo> },

    // =========================================================================
    // CONFIRMED
    // =========================================================================
    /// Maker logs buried under the confirmation depth.
    ConfirmedMaker { txs: Vec<CrossTransaction> },

    /// Taker logs buried under the confirmation depth.
    ConfirmedTaker {
        takers: Vec<CrossTransactionModifier>,
    },

    /// Finish logs buried under the confirmation depth.
    ConfirmedFinish {
        finishes: Vec<CrossTransactionModifier>,
    },
}

impl CrossChainEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NewTaker { .. } => EventTopic::NewTaker,
            Self::NewFinish { .. } => EventTopic::NewFinish,
            Self::AnchorUpdate { .. } => EventTopic::AnchorUpdate,
            Self::ConfirmedMaker { .. } => EventTopic::ConfirmedMaker,
            Self::ConfirmedTaker { .. } => EventTopic::ConfirmedTaker,
            Self::ConfirmedFinish { .. } => EventTopic::ConfirmedFinish,
        }
    }

    /// Number of items carried by the event.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::NewTaker { takers } | Self::ConfirmedTaker { takers } => takers.len(),
            Self::NewFinish { finishes } | Self::ConfirmedFinish { finishes } => finishes.len(),
            Self::AnchorUpdate { chain_info } => chain_info.len(),
            Self::ConfirmedMaker { txs } => txs.len(),
        }
    }

    /// Whether the event carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventTopic {
    NewTaker,
    NewFinish,
    AnchorUpdate,
    ConfirmedMaker,
    ConfirmedTaker,
    ConfirmedFinish,
}

impl EventTopic {
    /// Topics published only after confirmation depth.
    pub const CONFIRMED: [EventTopic; 3] = [
        EventTopic::ConfirmedMaker,
        EventTopic::ConfirmedTaker,
        EventTopic::ConfirmedFinish,
    ];

    /// Whether events on this topic wait for confirmation depth.
    #[must_use]
    pub fn is_confirmed(self) -> bool {
        Self::CONFIRMED.contains(&self)
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: EventTopic) -> Self {
        Self::topics(vec![topic])
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &CrossChainEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
