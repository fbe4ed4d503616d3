//! Scan execution for the command line.

use std::fs;
use tracing::{debug, warn};

use crate::aggregator::{Aggregator, ScanBundle};
use crate::config::Config;
use crate::error::{IoOperation, PostureError, Result};
use crate::reporter::Reporter;
use crate::{Cli, JsonReporter, OutputFormat, TerminalReporter};

/// Load the configuration for `cli` and apply its overrides.
///
/// An explicit `--config` must load; otherwise the current directory and
/// the global config are tried, falling back to defaults.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => {
            let cwd = std::env::current_dir().ok();
            Config::load(cwd.as_deref())
        }
    };
    config.apply_cli(cli)?;
    Ok(config)
}

/// Run every strategy against the path given on the command line.
pub fn run_scan(cli: &Cli) -> Result<ScanBundle> {
    let config = load_config(cli)?;
    debug!(?config, "Effective configuration");
    Aggregator::new(config).run(&cli.path)
}

pub fn format_bundle(cli: &Cli, bundle: &ScanBundle) -> String {
    match cli.format {
        OutputFormat::Terminal => TerminalReporter::new(cli.verbose).report(bundle),
        OutputFormat::Json => JsonReporter::new().report(bundle),
    }
}

/// Remove every directory the scan produced. Returns how many were removed.
pub fn cleanup(bundle: &ScanBundle) -> usize {
    let mut removed = 0;
    for dir in bundle.produced_dirs() {
        match fs::remove_dir_all(dir) {
            Ok(()) => removed += 1,
            Err(e) => {
                let e = PostureError::io(dir, IoOperation::Delete, e);
                warn!(error = %e, "Cleanup failed");
            }
        }
    }
    removed
}
