use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Start-up gate failures. Both are fatal.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("{hostname} did not resolve within {waited:?} ({attempts} attempts)")]
    NotReady {
        hostname: String,
        waited: Duration,
        attempts: u32,
    },

    #[error("no hostname configured for the readiness check; set `fqdn`")]
    NoHostname,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no config file found; searched: {}", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },
}

/// Error surface for the bridge runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("server was not ready in time: {0}")]
    NotReady(#[from] ReadinessError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("item store error: {0}")]
    Store(#[from] hecate_sync::StoreError),

    #[error("registry error: {0}")]
    Registry(#[from] hecate_core::RegistryError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
