//! Scan mode handler.

use std::fs;
use std::process::ExitCode;
use tracing::{debug, error, info};

use crate::Cli;
use crate::run::{cleanup, format_bundle, run_scan};

/// Run a scan and write the report. Exit code 2 on any fatal error.
pub fn run_normal_mode(cli: &Cli) -> ExitCode {
    info!(path = %cli.path.display(), "Starting scan");

    let bundle = match run_scan(cli) {
        Ok(bundle) => bundle,
        Err(e) => {
            error!(error = %e, "Scan failed");
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let output = format_bundle(cli, &bundle);

    if let Some(ref output_path) = cli.output {
        match fs::write(output_path, &output) {
            Ok(()) => {
                eprintln!("Output written to {}", output_path.display());
            }
            Err(e) => {
                eprintln!("Failed to write output to {}: {}", output_path.display(), e);
                return ExitCode::from(2);
            }
        }
    } else {
        println!("{}", output);
    }

    if cli.cleanup {
        let removed = cleanup(&bundle);
        debug!(removed, "Removed produced directories");
    }

    ExitCode::SUCCESS
}
