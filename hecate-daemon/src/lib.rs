//! Hecate daemon: readiness gate, configuration and the bridge runtime that
//! attaches the synchronizer to the webhook registry.

pub mod config;
mod error;
pub mod readiness;
mod runtime;

pub use config::Config;
pub use error::{ConfigError, DaemonError, ReadinessError};
pub use readiness::{DnsProbe, ReadinessGate, SystemResolver};
pub use runtime::{init_tracing, run, start_blocking, Bridge};
