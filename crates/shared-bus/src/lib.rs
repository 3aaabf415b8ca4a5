//! # Shared Bus - In-Process Event Fan-Out
//!
//! Carries cross-chain events from the log trigger to any number of local
//! consumers.
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐  one delivery task  ┌────────────┐
//! │ Log Trigger  │ ───────────► │  Event Bus   │ ──── per consumer ─► │ Subscriber │
//! └──────────────┘              └──────────────┘                      └────────────┘
//! ```
//!
//! ## Delivery Rules
//!
//! - Publishing never waits on a consumer: each matching subscription gets
//!   its own spawned delivery task.
//! - For one subscription, events arrive in publish order.
//! - Closing a `SubscriptionScope` revokes every subscription it tracks at
//!   once. Deliveries already in flight may still land.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{CrossChainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError, SubscriptionScope};

/// Maximum events to buffer per subscriber before delivery tasks queue up.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
