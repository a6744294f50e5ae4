//! Domain types shared by the registry, the codec and the synchronizer.
//!
//! Serialized field names follow the registration wire shape that other
//! services already decode (`registered_from_address`, `alt_urls`, ...).

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Webhook registration
// ---------------------------------------------------------------------------

/// Where and how events are delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryConfig {
    /// Target URL. This is the logical key of a registration.
    pub url: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_urls: Vec<String>,
}

/// Device/attribute matcher. An empty list matches every device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Matcher {
    #[serde(default)]
    pub device_id: Vec<String>,
}

/// One subscriber's delivery contract.
///
/// Read-only from the bridge's perspective. A later record with the same
/// `config.url` supersedes this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub registered_from_address: String,
    pub config: DeliveryConfig,
    #[serde(default)]
    pub failure_url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub matcher: Matcher,
    /// Validity duration, carried on the wire as nanoseconds.
    #[serde(with = "duration_nanos")]
    pub duration: Duration,
    /// Absolute expiration: creation time + `duration`.
    pub until: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partner_ids: Vec<String>,
}

impl WebhookRegistration {
    /// Destination URL (the registration's logical key).
    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.until <= now
    }
}

/// An ordered group of registrations delivered on one registry mutation.
pub type ChangeBatch = Vec<WebhookRegistration>;

// ---------------------------------------------------------------------------
// Synchronization item
// ---------------------------------------------------------------------------

/// Content-addressed entry pushed to the remote item store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Deterministic function of the destination URL.
    pub id: String,
    pub data: Map<String, Value>,
    /// Time-to-live in whole seconds.
    pub ttl: u64,
}

/// Result of one push attempt against the item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushOutcome {
    Created,
    Updated,
    Failed,
}

impl PushOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, PushOutcome::Created | PushOutcome::Updated)
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushOutcome::Created => write!(f, "created"),
            PushOutcome::Updated => write!(f, "updated"),
            PushOutcome::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// `Duration` as a single integer count of nanoseconds.
pub mod duration_nanos {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(d.as_nanos())
            .map_err(|_| <S::Error as serde::ser::Error>::custom("duration exceeds u64 nanoseconds"))?;
        s.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = i64::deserialize(d)?;
        if nanos < 0 {
            return Err(D::Error::custom(format!("negative duration: {nanos}ns")));
        }
        Ok(Duration::from_nanos(nanos as u64))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> WebhookRegistration {
        WebhookRegistration {
            registered_from_address: "10.0.0.7".to_string(),
            config: DeliveryConfig {
                url: "https://a.example/cb".to_string(),
                content_type: "application/json".to_string(),
                secret: None,
                alt_urls: vec![],
            },
            failure_url: "https://a.example/fail".to_string(),
            events: vec!["device-status.*".to_string()],
            matcher: Matcher::default(),
            duration: Duration::from_secs(60),
            until: Utc.with_ymd_and_hms(2026, 1, 1, 0, 1, 0).unwrap(),
            partner_ids: vec![],
        }
    }

    #[test]
    fn duration_is_carried_as_nanoseconds() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["duration"], serde_json::json!(60_000_000_000u64));
        assert_eq!(json["config"]["url"], "https://a.example/cb");
        assert!(json.get("partner_ids").is_none(), "empty partner_ids omitted");
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).expect("serialize");
        json["duration"] = serde_json::json!(-5);
        let err = serde_json::from_value::<WebhookRegistration>(json).unwrap_err();
        assert!(err.to_string().contains("negative duration"), "got: {err}");
    }

    #[test]
    fn expiry_is_inclusive_of_until() {
        let w = sample();
        assert!(!w.is_expired(w.until - chrono::Duration::seconds(1)));
        assert!(w.is_expired(w.until));
    }

    #[test]
    fn push_outcome_success_and_display() {
        assert!(PushOutcome::Created.is_success());
        assert!(PushOutcome::Updated.is_success());
        assert!(!PushOutcome::Failed.is_success());
        assert_eq!(PushOutcome::Updated.to_string(), "updated");
    }
}
