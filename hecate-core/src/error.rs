//! Error types for hecate-core.

use thiserror::Error;

/// All errors that can arise from registry and change-feed operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A registration arrived without a destination URL.
    #[error("webhook registration has no destination URL")]
    MissingUrl,

    /// The change feed was closed (by the writer at shutdown, or because the
    /// consumer went away).
    #[error("change feed is closed")]
    FeedClosed,
}
