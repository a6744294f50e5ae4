//! Error types for hecate-sync.

use thiserror::Error;

use hecate_core::PushOutcome;

/// A single registration could not be turned into an item.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("registration has no destination URL")]
    MissingUrl,

    #[error("invalid destination URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("validity duration {0:?} does not fit the stored shape")]
    DurationOutOfRange(std::time::Duration),

    /// Serialization of the stored shape failed.
    #[error("failed to encode item payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("item payload did not encode to a JSON object")]
    NotAnObject,
}

/// The push call itself failed; the store never answered.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error pushing to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("invalid item store address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: url::ParseError,
    },
}

/// Per-record failure classes observed by the synchronizer. None of them
/// stop the consumer loop.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to convert webhook to item: {0}")]
    Conversion(#[from] ConversionError),

    #[error("failed to push item to the store: {0}")]
    PushTransport(#[from] StoreError),

    #[error("unexpected push outcome {outcome} for item {item_id}")]
    UnexpectedPushOutcome { item_id: String, outcome: PushOutcome },
}
