use clap::Parser;
use posture_audit::{Cli, handlers::run_normal_mode, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    run_normal_mode(&cli)
}
