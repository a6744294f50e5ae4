//! Remote item store boundary.
//!
//! [`ItemStore::push`] is one blocking round trip with no retry. A store that
//! answered maps to a [`PushOutcome`]; a store that could not be reached is a
//! [`StoreError`].

use std::sync::Arc;
use std::time::Duration;

use hecate_core::{Item, PushOutcome};

use crate::error::StoreError;

/// Header carrying the item's owning tenant.
pub const OWNER_HEADER: &str = "X-Midt-Owner";

pub trait ItemStore: Send + Sync {
    fn push(&self, owner: &str, bucket: &str, item: &Item) -> Result<PushOutcome, StoreError>;
}

impl<S: ItemStore + ?Sized> ItemStore for Arc<S> {
    fn push(&self, owner: &str, bucket: &str, item: &Item) -> Result<PushOutcome, StoreError> {
        (**self).push(owner, bucket, item)
    }
}

impl<S: ItemStore + ?Sized> ItemStore for Box<S> {
    fn push(&self, owner: &str, bucket: &str, item: &Item) -> Result<PushOutcome, StoreError> {
        (**self).push(owner, bucket, item)
    }
}

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base address, e.g. `http://argus:6600`.
    pub address: String,
    /// Sent verbatim as the `Authorization` header when set.
    pub authorization: Option<String>,
    pub timeout: Duration,
}

/// `PUT {address}/api/v1/store/{bucket}/{id}` over a blocking HTTP agent.
pub struct HttpItemStore {
    agent: ureq::Agent,
    base: String,
    authorization: Option<String>,
}

impl HttpItemStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        url::Url::parse(&config.address).map_err(|source| StoreError::Address {
            address: config.address.clone(),
            source,
        })?;

        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            agent,
            base: config.address.trim_end_matches('/').to_string(),
            authorization: config.authorization,
        })
    }

    pub fn item_url(&self, bucket: &str, id: &str) -> String {
        format!("{}/api/v1/store/{bucket}/{id}", self.base)
    }
}

impl ItemStore for HttpItemStore {
    fn push(&self, owner: &str, bucket: &str, item: &Item) -> Result<PushOutcome, StoreError> {
        let url = self.item_url(bucket, &item.id);
        let mut request = self.agent.put(&url).set(OWNER_HEADER, owner);
        if let Some(auth) = &self.authorization {
            request = request.set("Authorization", auth);
        }

        match request.send_json(item) {
            Ok(response) => Ok(outcome_for_status(response.status())),
            Err(ureq::Error::Status(status, _)) => {
                tracing::debug!(status, url = %url, "item store rejected push");
                Ok(outcome_for_status(status))
            }
            Err(ureq::Error::Transport(source)) => Err(StoreError::Transport {
                url,
                source: Box::new(source),
            }),
        }
    }
}

fn outcome_for_status(status: u16) -> PushOutcome {
    match status {
        201 => PushOutcome::Created,
        200 => PushOutcome::Updated,
        _ => PushOutcome::Failed,
    }
}
