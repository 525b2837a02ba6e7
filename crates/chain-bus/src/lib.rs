//! # Chain Bus
//!
//! In-process publish/subscribe event bus (C10): the single channel
//! through which `chain-consensus` and `chain-sync` announce chain
//! changes to projections, webhooks, and the metrics registry.
//!
//! Subsystems never call each other directly; they publish events here
//! and whoever cares subscribes with a filter.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{ChainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
