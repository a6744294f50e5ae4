//! Synchronizer — the single consumer of the registry's change feed.
//!
//! # States
//!
//! ```text
//! Idle ──attach──▶ Attached ──feed closed──▶ Draining ──▶ Stopped
//! ```
//!
//! Transitions only move forward. A stopped synchronizer cannot be
//! re-attached; construct a new one.
//!
//! Records inside a batch are pushed one after another on one blocking
//! thread. A record that fails to convert is skipped; a failed or unexpected
//! push is logged. Neither stops the batch or the loop, the next batch from
//! the registry carries the record again.

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use hecate_core::{ChangeBatch, FeedReceiver, PushOutcome, WebhookRegistration};

use crate::codec::to_item;
use crate::error::SyncError;
use crate::store::ItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynchronizerState {
    Idle,
    Attached,
    Draining,
    Stopped,
}

/// Per-batch outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub created: usize,
    pub updated: usize,
    /// Transport errors and unexpected outcomes.
    pub failed: usize,
    /// Records that never reached the store (conversion errors).
    pub skipped: usize,
}

impl BatchReport {
    /// Push attempts made, successful or not.
    pub fn attempted(&self) -> usize {
        self.created + self.updated + self.failed
    }
}

/// Totals over the synchronizer's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub batches: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SyncStats {
    fn record(&mut self, report: &BatchReport) {
        self.batches += 1;
        self.created += report.created;
        self.updated += report.updated;
        self.failed += report.failed;
        self.skipped += report.skipped;
    }

    pub fn attempted(&self) -> usize {
        self.created + self.updated + self.failed
    }
}

pub struct Synchronizer<S> {
    store: S,
    owner: String,
    bucket: String,
    stats: SyncStats,
    state: watch::Sender<SynchronizerState>,
}

impl<S: ItemStore + 'static> Synchronizer<S> {
    pub fn new(store: S, owner: impl Into<String>, bucket: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SynchronizerState::Idle);
        Self {
            store,
            owner: owner.into(),
            bucket: bucket.into(),
            stats: SyncStats::default(),
            state,
        }
    }

    pub fn state(&self) -> SynchronizerState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Process one change batch in order.
    pub fn notify(&mut self, batch: ChangeBatch) -> BatchReport {
        let mut report = BatchReport::default();

        for webhook in &batch {
            match self.sync_record(webhook) {
                Ok(PushOutcome::Created) => report.created += 1,
                // sync_record never returns Ok(Failed)
                Ok(_) => report.updated += 1,
                Err(err @ SyncError::Conversion(_)) => {
                    tracing::error!(url = %webhook.url(), error = %err, "failed to convert webhook to item");
                    report.skipped += 1;
                }
                Err(err @ SyncError::PushTransport(_)) => {
                    tracing::error!(url = %webhook.url(), error = %err, "failed to push item to the store");
                    report.failed += 1;
                }
                Err(err @ SyncError::UnexpectedPushOutcome { .. }) => {
                    tracing::error!(url = %webhook.url(), error = %err, "unsuccessful item push response from the store");
                    report.failed += 1;
                }
            }
        }

        self.stats.record(&report);
        tracing::info!(
            records = batch.len(),
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            "processed webhook change batch",
        );
        report
    }

    /// Convert and push a single registration.
    pub fn sync_record(&self, webhook: &WebhookRegistration) -> Result<PushOutcome, SyncError> {
        tracing::info!(url = %webhook.url(), "pushing webhook update into the item store");

        let item = to_item(webhook)?;
        let outcome = self.store.push(&self.owner, &self.bucket, &item)?;
        if !outcome.is_success() {
            return Err(SyncError::UnexpectedPushOutcome {
                item_id: item.id,
                outcome,
            });
        }

        tracing::debug!(item_id = %item.id, outcome = %outcome, "pushed webhook item");
        Ok(outcome)
    }

    /// Start consuming `feed` on a dedicated blocking thread.
    ///
    /// Must be called from within a tokio runtime. The returned handle joins
    /// once the feed is closed and every buffered batch was processed.
    pub fn attach(mut self, mut feed: FeedReceiver) -> SynchronizerHandle {
        self.set_state(SynchronizerState::Attached);
        let state = self.state.subscribe();

        let join = tokio::task::spawn_blocking(move || {
            while let Some(batch) = feed.blocking_recv() {
                self.notify(batch);
            }

            self.set_state(SynchronizerState::Draining);
            tracing::info!(
                batches = self.stats.batches,
                attempted = self.stats.attempted(),
                failed = self.stats.failed,
                skipped = self.stats.skipped,
                "webhook change feed closed, synchronizer stopping",
            );
            self.set_state(SynchronizerState::Stopped);
            self.stats
        });

        SynchronizerHandle { state, join }
    }

    fn set_state(&self, next: SynchronizerState) {
        self.state.send_replace(next);
    }
}

/// Termination signal and state view for an attached synchronizer.
pub struct SynchronizerHandle {
    state: watch::Receiver<SynchronizerState>,
    join: JoinHandle<SyncStats>,
}

impl SynchronizerHandle {
    pub fn state(&self) -> SynchronizerState {
        *self.state.borrow()
    }

    /// A receiver that observes every later state transition.
    pub fn subscribe(&self) -> watch::Receiver<SynchronizerState> {
        self.state.clone()
    }

    /// Wait for the consumer to stop and return its lifetime totals.
    pub async fn join(self) -> Result<SyncStats, JoinError> {
        self.join.await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Utc;
    use hecate_core::{change_feed, DeliveryConfig, Item, Matcher};

    use super::*;
    use crate::error::StoreError;

    #[derive(Default)]
    struct CountingStore {
        pushes: Mutex<Vec<String>>,
    }

    impl ItemStore for CountingStore {
        fn push(&self, _owner: &str, _bucket: &str, item: &Item) -> Result<PushOutcome, StoreError> {
            self.pushes.lock().unwrap().push(item.id.clone());
            Ok(PushOutcome::Created)
        }
    }

    fn hook(url: &str) -> WebhookRegistration {
        WebhookRegistration {
            registered_from_address: String::new(),
            config: DeliveryConfig {
                url: url.to_string(),
                content_type: "application/json".to_string(),
                ..DeliveryConfig::default()
            },
            failure_url: String::new(),
            events: vec![],
            matcher: Matcher::default(),
            duration: Duration::from_secs(30),
            until: Utc::now(),
            partner_ids: vec![],
        }
    }

    #[test]
    fn new_synchronizer_is_idle() {
        let sync = Synchronizer::new(CountingStore::default(), "argus", "webhooks");
        assert_eq!(sync.state(), SynchronizerState::Idle);
        assert_eq!(sync.stats(), SyncStats::default());
    }

    #[test]
    fn notify_counts_skipped_records_separately() {
        let mut sync = Synchronizer::new(CountingStore::default(), "argus", "webhooks");
        let report = sync.notify(vec![hook(""), hook("https://a.example/cb")]);
        assert_eq!(
            report,
            BatchReport {
                created: 1,
                updated: 0,
                failed: 0,
                skipped: 1
            }
        );
        assert_eq!(report.attempted(), 1);
        assert_eq!(sync.store.pushes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attach_moves_to_attached_then_stopped() {
        let (tx, rx) = change_feed(4);
        let handle =
            Synchronizer::new(CountingStore::default(), "argus", "webhooks").attach(rx);
        let watch = handle.subscribe();
        assert_ne!(handle.state(), SynchronizerState::Idle);

        tx.close();
        let stats = handle.join().await.expect("join");
        assert_eq!(*watch.borrow(), SynchronizerState::Stopped);
        assert_eq!(stats.batches, 0);
    }
}
