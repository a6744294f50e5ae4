//! Item codec — registration → content-addressed store item.
//!
//! The identifier is derived from the destination URL alone, so a refreshed
//! registration (new events, new duration) overwrites the existing store
//! entry instead of creating a second one.
//!
//! The payload goes through one explicit mapping, [`StoredWebhookV1`]. Any
//! change to the stored shape is a new version of that struct, never an
//! implicit consequence of editing [`WebhookRegistration`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use hecate_core::{Item, WebhookRegistration};

use crate::error::ConversionError;

/// Stored delivery config, version 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredConfigV1 {
    pub url: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub alt_urls: Vec<String>,
}

/// Stored matcher, version 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMatcherV1 {
    pub device_id: Vec<String>,
}

/// The shape readers of the item store expect under `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredWebhookV1 {
    pub registered_from_address: String,
    pub config: StoredConfigV1,
    pub failure_url: String,
    pub events: Vec<String>,
    pub matcher: StoredMatcherV1,
    /// Nanoseconds.
    pub duration: u64,
    /// RFC 3339, UTC.
    pub until: String,
    pub partner_ids: Vec<String>,
}

impl StoredWebhookV1 {
    pub fn from_registration(w: &WebhookRegistration) -> Result<Self, ConversionError> {
        let duration = u64::try_from(w.duration.as_nanos())
            .map_err(|_| ConversionError::DurationOutOfRange(w.duration))?;

        Ok(Self {
            registered_from_address: w.registered_from_address.clone(),
            config: StoredConfigV1 {
                url: w.config.url.clone(),
                content_type: w.config.content_type.clone(),
                secret: w.config.secret.clone(),
                alt_urls: w.config.alt_urls.clone(),
            },
            failure_url: w.failure_url.clone(),
            events: w.events.clone(),
            matcher: StoredMatcherV1 {
                device_id: w.matcher.device_id.clone(),
            },
            duration,
            until: w.until.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            partner_ids: w.partner_ids.clone(),
        })
    }
}

/// Content address for a destination URL: unpadded URL-safe base64 of its
/// SHA-256 digest.
pub fn item_id(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(url.as_bytes()))
}

/// Convert one registration into a store item.
///
/// Fails per record; callers skip the record and keep going.
pub fn to_item(w: &WebhookRegistration) -> Result<Item, ConversionError> {
    validate_url(w.url())?;

    let stored = StoredWebhookV1::from_registration(w)?;
    let Value::Object(data) = serde_json::to_value(&stored)? else {
        return Err(ConversionError::NotAnObject);
    };

    Ok(Item {
        id: item_id(w.url()),
        data,
        ttl: w.duration.as_secs(),
    })
}

fn validate_url(raw: &str) -> Result<(), ConversionError> {
    if raw.trim().is_empty() {
        return Err(ConversionError::MissingUrl);
    }
    let parsed = url::Url::parse(raw).map_err(|e| ConversionError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConversionError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use hecate_core::{DeliveryConfig, Matcher};
    use rstest::rstest;

    use super::*;

    fn registration(url: &str, duration: Duration) -> WebhookRegistration {
        WebhookRegistration {
            registered_from_address: "198.51.100.4".to_string(),
            config: DeliveryConfig {
                url: url.to_string(),
                content_type: "application/msgpack".to_string(),
                secret: Some("s3cr3t".to_string()),
                alt_urls: vec!["https://b.example/cb".to_string()],
            },
            failure_url: "https://a.example/failure".to_string(),
            events: vec!["device-status/.*/offline".to_string()],
            matcher: Matcher {
                device_id: vec!["mac:112233445566".to_string()],
            },
            duration,
            until: Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap(),
            partner_ids: vec!["comcast".to_string()],
        }
    }

    #[test]
    fn identifier_is_base64url_sha256_of_url() {
        let item = to_item(&registration("https://a.example/cb", Duration::from_secs(60)))
            .expect("convert");
        assert_eq!(item.id, "l22QYPGSPWhFMG2NdMk9lZ8ZCsQFVifQhgEuOp2sT-A");
        assert_eq!(item.id.len(), 43);
        assert_eq!(item.ttl, 60);
    }

    #[test]
    fn identifier_ignores_every_field_but_the_url() {
        let a = registration("https://a.example/cb", Duration::from_secs(60));
        let mut b = registration("https://a.example/cb", Duration::from_secs(3600));
        b.events = vec!["something-else".to_string()];
        b.partner_ids.clear();
        b.matcher.device_id.clear();

        let (ia, ib) = (to_item(&a).expect("a"), to_item(&b).expect("b"));
        assert_eq!(ia.id, ib.id);
        assert_ne!(ia.data, ib.data);
    }

    #[test]
    fn different_urls_yield_different_identifiers() {
        let a = to_item(&registration("https://a.example/cb", Duration::from_secs(1))).unwrap();
        let b = to_item(&registration("https://b.example/cb", Duration::from_secs(1))).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[rstest]
    #[case(Duration::from_secs(60), 60)]
    #[case(Duration::from_millis(1_500), 1)]
    #[case(Duration::from_millis(999), 0)]
    #[case(Duration::from_secs(86_400), 86_400)]
    fn ttl_is_whole_seconds_of_duration(#[case] duration: Duration, #[case] ttl: u64) {
        let item = to_item(&registration("https://a.example/cb", duration)).expect("convert");
        assert_eq!(item.ttl, ttl);
    }

    #[test]
    fn payload_carries_every_registration_field() {
        let item = to_item(&registration("https://a.example/cb", Duration::from_secs(60)))
            .expect("convert");
        let data = Value::Object(item.data);

        assert_eq!(data["registered_from_address"], "198.51.100.4");
        assert_eq!(data["config"]["url"], "https://a.example/cb");
        assert_eq!(data["config"]["content_type"], "application/msgpack");
        assert_eq!(data["config"]["secret"], "s3cr3t");
        assert_eq!(data["config"]["alt_urls"][0], "https://b.example/cb");
        assert_eq!(data["failure_url"], "https://a.example/failure");
        assert_eq!(data["events"][0], "device-status/.*/offline");
        assert_eq!(data["matcher"]["device_id"][0], "mac:112233445566");
        assert_eq!(data["duration"], 60_000_000_000u64);
        assert_eq!(data["until"], "2026-03-01T12:01:00Z");
        assert_eq!(data["partner_ids"][0], "comcast");
    }

    #[rstest]
    #[case("")]
    #[case("not a url")]
    #[case("ftp://a.example/cb")]
    fn malformed_destination_is_a_conversion_error(#[case] url: &str) {
        let err = to_item(&registration(url, Duration::from_secs(60))).unwrap_err();
        assert!(
            matches!(
                err,
                ConversionError::MissingUrl | ConversionError::InvalidUrl { .. }
            ),
            "got: {err}"
        );
    }

    #[test]
    fn oversized_duration_is_rejected() {
        let err = to_item(&registration("https://a.example/cb", Duration::MAX)).unwrap_err();
        assert!(matches!(err, ConversionError::DurationOutOfRange(_)), "got: {err}");
    }
}
