use std::sync::Arc;

use tokio::sync::Mutex;

use hecate_core::{change_feed, WebhookRegistry};
use hecate_sync::{HttpItemStore, ItemStore, SyncStats, Synchronizer, SynchronizerHandle};

use crate::config::{Config, LogConfig};
use crate::error::{io_err, DaemonError};
use crate::readiness::{DnsProbe, SystemResolver};

/// A running bridge: the registry producing change batches and the attached
/// synchronizer consuming them.
pub struct Bridge {
    registry: Arc<Mutex<WebhookRegistry>>,
    sync: SynchronizerHandle,
}

impl Bridge {
    /// Gate on readiness, then wire registry → feed → synchronizer.
    ///
    /// Nothing is attached when the gate fails; the caller must treat the
    /// error as fatal and not accept confirmations.
    pub async fn start<P, S>(config: &Config, probe: &P, store: S) -> Result<Self, DaemonError>
    where
        P: DnsProbe,
        S: ItemStore + 'static,
    {
        let gate = config.readiness_gate();
        if let Err(err) = gate.await_ready(probe).await {
            tracing::error!(
                error = %err,
                "server was not ready within the time budget; subscription confirmations cannot happen",
            );
            return Err(err.into());
        }

        let settle = config.settle_delay();
        if !settle.is_zero() {
            tracing::debug!(?settle, "waiting before accepting confirmations");
            tokio::time::sleep(settle).await;
        }

        let (tx, rx) = change_feed(config.feed_capacity);
        let sync = Synchronizer::new(store, config.argus.owner.as_str(), config.argus.bucket.as_str())
            .attach(rx);
        let registry = Arc::new(Mutex::new(WebhookRegistry::new(tx)));

        tracing::info!(
            self_url = %config.self_url(),
            "server is ready to take on subscription confirmations"
        );
        Ok(Self { registry, sync })
    }

    /// The registry that the confirmation handshake feeds.
    pub fn registry(&self) -> Arc<Mutex<WebhookRegistry>> {
        self.registry.clone()
    }

    pub fn synchronizer(&self) -> &SynchronizerHandle {
        &self.sync
    }

    /// Close the change feed and wait for the synchronizer to drain.
    pub async fn shutdown(self) -> Result<SyncStats, DaemonError> {
        self.registry.lock().await.close();
        let stats = self.sync.join().await.map_err(|err| DaemonError::Join {
            task: "synchronizer",
            message: err.to_string(),
        })?;
        tracing::info!(
            batches = stats.batches,
            created = stats.created,
            updated = stats.updated,
            failed = stats.failed,
            skipped = stats.skipped,
            "synchronizer stopped",
        );
        Ok(stats)
    }
}

/// Start the bridge against the configured item store and block the current
/// thread until it exits.
pub fn start_blocking(config: Config) -> Result<SyncStats, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run until ctrl-c, then shut down cleanly.
pub async fn run(config: Config) -> Result<SyncStats, DaemonError> {
    tracing::info!(address = %config.argus.address, bucket = %config.argus.bucket, "item store");
    let store = HttpItemStore::new(config.store_config())?;
    let bridge = Bridge::start(&config, &SystemResolver::default(), store).await?;

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "ctrl-c handler failed, shutting down");
    } else {
        tracing::info!("received ctrl-c, shutting down");
    }
    bridge.shutdown().await
}

/// Install the global subscriber. `force_debug` wins over `RUST_LOG`, which
/// wins over `log.level`.
pub fn init_tracing(log: &LogConfig, force_debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let directive = log_directive(log, force_debug, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = if log.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn log_directive(log: &LogConfig, force_debug: bool, env: Option<String>) -> String {
    if force_debug {
        return "debug".to_string();
    }
    env.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| log.level.clone())
}
