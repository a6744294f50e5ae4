//! Change feed — the single shared resource between the registry (writer)
//! and the synchronizer (reader).
//!
//! A bounded tokio mpsc channel: a slow consumer applies backpressure to the
//! writer instead of dropping batches or growing memory without limit.
//! [`FeedSender`] is not `Clone`, and [`FeedSender::close`] consumes it, so
//! the feed has exactly one writer and is closed at most once.

use tokio::sync::mpsc;

use crate::error::RegistryError;
use crate::types::ChangeBatch;

pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Largest accepted capacity. tokio rejects bounds above its semaphore limit.
pub const MAX_FEED_CAPACITY: usize = 1 << 20;

/// Create a connected feed pair. `capacity` is clamped to
/// `1..=MAX_FEED_CAPACITY`.
pub fn change_feed(capacity: usize) -> (FeedSender, FeedReceiver) {
    let (tx, rx) = mpsc::channel(capacity.clamp(1, MAX_FEED_CAPACITY));
    (FeedSender { tx }, FeedReceiver { rx })
}

/// Writing half of the change feed.
#[derive(Debug)]
pub struct FeedSender {
    tx: mpsc::Sender<ChangeBatch>,
}

impl FeedSender {
    /// Queue a batch, waiting for capacity when the consumer is behind.
    pub async fn send(&self, batch: ChangeBatch) -> Result<(), RegistryError> {
        self.tx
            .send(batch)
            .await
            .map_err(|_| RegistryError::FeedClosed)
    }

    /// Blocking variant of [`send`](Self::send) for callers outside a runtime.
    pub fn blocking_send(&self, batch: ChangeBatch) -> Result<(), RegistryError> {
        self.tx
            .blocking_send(batch)
            .map_err(|_| RegistryError::FeedClosed)
    }

    /// Close the feed. Batches already queued are still delivered.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Reading half of the change feed.
#[derive(Debug)]
pub struct FeedReceiver {
    rx: mpsc::Receiver<ChangeBatch>,
}

impl FeedReceiver {
    /// Next batch, or `None` once the writer closed and the buffer is empty.
    pub async fn recv(&mut self) -> Option<ChangeBatch> {
        self.rx.recv().await
    }

    /// Blocking variant for a dedicated consumer thread. Must not be called
    /// from within an async context.
    pub fn blocking_recv(&mut self) -> Option<ChangeBatch> {
        self.rx.blocking_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffered_batches_survive_close() {
        let (tx, mut rx) = change_feed(4);
        tx.send(vec![]).await.expect("send first");
        tx.send(vec![]).await.expect("send second");
        tx.close();

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none(), "closed feed yields None once drained");
    }

    #[tokio::test]
    async fn send_fails_once_reader_is_gone() {
        let (tx, rx) = change_feed(1);
        drop(rx);
        assert_eq!(tx.send(vec![]).await, Err(RegistryError::FeedClosed));
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let (tx, mut rx) = change_feed(0);
        tx.send(vec![]).await.expect("capacity of one");
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn oversized_capacity_is_clamped() {
        let (tx, mut rx) = change_feed(usize::MAX);
        assert_eq!(tx.tx.max_capacity(), MAX_FEED_CAPACITY);
        tx.send(vec![]).await.expect("send");
        assert!(rx.recv().await.is_some());
    }
}
