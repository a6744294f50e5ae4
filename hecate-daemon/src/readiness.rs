//! Start-up readiness gate.
//!
//! The provider can only confirm a subscription once our public hostname
//! resolves, so the bridge does not start until a DNS probe succeeds or the
//! time budget runs out. Evaluated once at start-up; this is not a health
//! check.
//!
//! Timing goes through `tokio::time`, so tests drive it with a paused clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ReadinessError;

const MIN_INTERVAL: Duration = Duration::from_millis(1);
/// Upper bound on the budget; larger values would overflow the deadline.
const MAX_TIMEOUT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Answers whether `host` currently resolves.
pub trait DnsProbe: Send + Sync {
    fn resolves(&self, host: &str) -> impl Future<Output = bool> + Send;
}

/// Probe backed by the system resolver.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    /// Port paired with the host for the lookup; only the name is checked.
    pub port: u16,
    pub attempt_timeout: Duration,
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self {
            port: 443,
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

impl DnsProbe for SystemResolver {
    fn resolves(&self, host: &str) -> impl Future<Output = bool> + Send {
        let target = format!("{host}:{}", self.port);
        let attempt_timeout = self.attempt_timeout;
        async move {
            match tokio::time::timeout(attempt_timeout, tokio::net::lookup_host(target.as_str()))
                .await
            {
                Ok(Ok(mut addrs)) => addrs.next().is_some(),
                Ok(Err(err)) => {
                    tracing::debug!(target = %target, error = %err, "DNS lookup failed");
                    false
                }
                Err(_) => {
                    tracing::debug!(target = %target, "DNS lookup timed out");
                    false
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadinessGate {
    hostname: String,
    timeout: Duration,
    interval: Duration,
}

impl ReadinessGate {
    pub fn new(hostname: impl Into<String>, timeout: Duration, interval: Duration) -> Self {
        Self {
            hostname: hostname.into(),
            timeout: timeout.min(MAX_TIMEOUT),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Probe until `hostname` resolves. Returns the time spent waiting, or
    /// `NotReady` once the whole budget has elapsed.
    ///
    /// A probe still running at the deadline is abandoned and counts as a
    /// failed attempt.
    pub async fn await_ready<P: DnsProbe>(&self, probe: &P) -> Result<Duration, ReadinessError> {
        if self.hostname.trim().is_empty() {
            return Err(ReadinessError::NoHostname);
        }

        let started = Instant::now();
        let Some(deadline) = started.checked_add(self.timeout) else {
            return Err(ReadinessError::NotReady {
                hostname: self.hostname.clone(),
                waited: Duration::ZERO,
                attempts: 0,
            });
        };
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let resolved = tokio::time::timeout_at(deadline, probe.resolves(&self.hostname))
                .await
                .unwrap_or(false);
            if resolved {
                let waited = started.elapsed();
                tracing::info!(hostname = %self.hostname, attempts, ?waited, "hostname resolves");
                return Ok(waited);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ReadinessError::NotReady {
                    hostname: self.hostname.clone(),
                    waited: now - started,
                    attempts,
                });
            }
            tracing::debug!(hostname = %self.hostname, attempts, "hostname not resolvable yet");
            tokio::time::sleep(self.interval.min(deadline - now)).await;
        }
    }
}
