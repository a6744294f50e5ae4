//! Hecate — bridges confirmed webhook registrations into the shared item
//! store.
//!
//! # Usage
//!
//! ```text
//! hecate [--file <path>] [--debug]
//! hecate --version
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use hecate_daemon::{config, init_tracing, start_blocking};

#[derive(Parser, Debug)]
#[command(
    name = "hecate",
    version,
    about = "Synchronize webhook registrations into the shared item store",
    long_about = None,
    disable_version_flag = true,
)]
struct Cli {
    /// The configuration file to use. Overrides the search path.
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Enable debug logging. Overrides configuration.
    #[arg(short = 'd', long)]
    debug: bool,

    /// Print version information and exit.
    #[arg(short = 'v', long)]
    version: bool,
}

/// Release builds set `HECATE_GIT_COMMIT` and `HECATE_BUILD_TIME` in the
/// compile environment.
fn version_info() -> String {
    format!(
        "{name}:\n  version:    {version}\n  git commit: {commit}\n  built:      {built}\n  os/arch:    {os}/{arch}\n",
        name = env!("CARGO_BIN_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        commit = option_env!("HECATE_GIT_COMMIT").unwrap_or("unknown"),
        built = option_env!("HECATE_BUILD_TIME").unwrap_or("unknown"),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        print!("{}", version_info());
        return Ok(());
    }

    let (path, cfg) =
        config::discover(cli.file.as_deref()).context("failed to load configuration")?;
    init_tracing(&cfg.log, cli.debug);
    tracing::info!(config = %path.display(), "loaded configuration");

    let stats = start_blocking(cfg).context("hecate exited with error")?;
    tracing::info!(
        batches = stats.batches,
        attempted = stats.attempted(),
        "hecate stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_info_reports_build_details() {
        let info = version_info();
        assert!(info.starts_with("hecate:"), "got: {info}");
        assert!(info.contains(env!("CARGO_PKG_VERSION")));
        assert!(info.contains("git commit:"));
        assert!(info.contains("built:"));
        assert!(info.contains(&format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)));
    }

    #[test]
    fn version_flag_parses_short_and_long() {
        assert!(Cli::parse_from(["hecate", "-v"]).version);
        assert!(Cli::parse_from(["hecate", "--version"]).version);
        assert!(!Cli::parse_from(["hecate", "-d"]).version);
    }
}
