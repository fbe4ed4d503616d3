pub mod aggregator;
pub mod cicd;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod finders;
pub mod handlers;
pub mod logging;
pub mod registry;
pub mod reporter;
pub mod run;

pub use aggregator::{AggregateManifest, Aggregator, ScanBundle};
pub use cicd::{CiCdOutcome, CiCdProvider, FailedRules, NO_CI_CD_TOOL, detect_ci_cd, is_ci_cd_there};
pub use cli::{Cli, OutputFormat};
pub use cloud::{CloudProvider, CredentialBundle, IacExtractionTool};
pub use config::{Config, ConfigError};
pub use error::{PostureError, Result, ToolError};
pub use external::{
    AdditionalScanProducer, ScanParameters, perform_external_scans_and_return_folders,
};
pub use finders::{Applicability, ConfigFileFinder};
pub use registry::{CapabilityKind, Registry};
pub use reporter::{Reporter, json::JsonReporter, terminal::TerminalReporter};
