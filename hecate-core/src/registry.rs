//! In-memory webhook registry.
//!
//! Holds the live set of registrations keyed by destination URL and emits
//! the full live set, sorted by URL, as one [`ChangeBatch`] on every
//! mutation. Callers pass `now` explicitly so expiry is deterministic in
//! tests.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::RegistryError;
use crate::feed::FeedSender;
use crate::types::{ChangeBatch, WebhookRegistration};

/// Validity applied to registrations that arrive with a zero duration.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
pub struct WebhookRegistry {
    hooks: BTreeMap<String, WebhookRegistration>,
    feed: Option<FeedSender>,
}

impl WebhookRegistry {
    pub fn new(feed: FeedSender) -> Self {
        Self {
            hooks: BTreeMap::new(),
            feed: Some(feed),
        }
    }

    /// Add or refresh a registration and emit the resulting batch.
    ///
    /// `until` is recomputed as `now + duration`; any caller-supplied value
    /// is overwritten.
    pub async fn register(
        &mut self,
        mut record: WebhookRegistration,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if self.feed.is_none() {
            return Err(RegistryError::FeedClosed);
        }
        if record.config.url.trim().is_empty() {
            return Err(RegistryError::MissingUrl);
        }
        if record.duration.is_zero() {
            record.duration = DEFAULT_DURATION;
        }
        record.until = expiry(now, record.duration);

        tracing::debug!(url = %record.config.url, until = %record.until, "registering webhook");
        self.hooks.insert(record.config.url.clone(), record);
        self.prune_expired(now);
        self.emit().await
    }

    /// Drop the registration for `url`. Emits only when something was removed.
    pub async fn remove(&mut self, url: &str, now: DateTime<Utc>) -> Result<bool, RegistryError> {
        if self.feed.is_none() {
            return Err(RegistryError::FeedClosed);
        }
        let removed = self.hooks.remove(url).is_some();
        self.prune_expired(now);
        if removed {
            self.emit().await?;
        }
        Ok(removed)
    }

    /// Forget every registration whose `until` has passed. Returns how many
    /// were dropped.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.hooks.len();
        self.hooks.retain(|_, w| !w.is_expired(now));
        before - self.hooks.len()
    }

    /// Live registrations sorted by destination URL.
    pub fn list(&self, now: DateTime<Utc>) -> ChangeBatch {
        self.hooks
            .values()
            .filter(|w| !w.is_expired(now))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Close the change feed. Idempotent; only the first call closes.
    pub fn close(&mut self) {
        if let Some(feed) = self.feed.take() {
            tracing::debug!("closing webhook change feed");
            feed.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.feed.is_none()
    }

    async fn emit(&self) -> Result<(), RegistryError> {
        let Some(feed) = &self.feed else {
            return Err(RegistryError::FeedClosed);
        };
        let batch: ChangeBatch = self.hooks.values().cloned().collect();
        feed.send(batch).await
    }
}

fn expiry(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
