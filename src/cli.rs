use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "posture-audit",
    version,
    about = "Collects service configuration, cloud IaC and CI/CD artifacts for posture analysis",
    long_about = "posture-audit walks an extracted filesystem, stages the configuration files of \
                  known services, optionally exports cloud infrastructure as code and runs external \
                  scanners, and writes a single manifest of everything it collected."
)]
pub struct Cli {
    /// Root of the extracted filesystem to inspect
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (defaults to .posture-audit.{yaml,json,toml} in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only run the finders for these services (repeatable)
    #[arg(long = "service", value_name = "NAME")]
    pub services: Vec<String>,

    /// Extract IaC for this cloud provider (repeatable)
    #[arg(long = "cloud", value_name = "PROVIDER")]
    pub cloud_providers: Vec<String>,

    /// Explicit cloud credentials file
    #[arg(long)]
    pub credentials_file: Option<PathBuf>,

    /// Run this external scanner (repeatable)
    #[arg(short = 'a', long = "additional-scanner", value_name = "ID")]
    pub additional_scanners: Vec<String>,

    /// Parameter passed to external scanners, as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Remove staging directories after the report has been written
    #[arg(long)]
    pub cleanup: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
