//! # hecate-sync
//!
//! Bridge from the webhook registry's change feed to the remote item store.
//!
//! [`codec::to_item`] turns a registration into a content-addressed
//! [`Item`](hecate_core::Item); [`store::ItemStore`] is the push boundary;
//! [`Synchronizer`] drains change batches and classifies each push.

pub mod codec;
pub mod error;
pub mod store;
pub mod synchronizer;

pub use codec::{item_id, to_item, StoredWebhookV1};
pub use error::{ConversionError, StoreError, SyncError};
pub use store::{HttpItemStore, HttpStoreConfig, ItemStore};
pub use synchronizer::{
    BatchReport, SyncStats, Synchronizer, SynchronizerHandle, SynchronizerState,
};
