//! Hecate core library — webhook registration types, the change feed and the
//! in-memory webhook registry that produces change batches.
//!
//! - [`types`] — registrations, items, push outcomes
//! - [`feed`] — bounded single-producer/single-consumer change feed
//! - [`registry`] — in-memory registry emitting a batch on every mutation
//! - [`error`] — [`RegistryError`]

pub mod error;
pub mod feed;
pub mod registry;
pub mod types;

pub use error::RegistryError;
pub use feed::{change_feed, FeedReceiver, FeedSender, DEFAULT_FEED_CAPACITY, MAX_FEED_CAPACITY};
pub use registry::{WebhookRegistry, DEFAULT_DURATION};
pub use types::{
    ChangeBatch, DeliveryConfig, Item, Matcher, PushOutcome, WebhookRegistration,
};
