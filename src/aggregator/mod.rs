//! Aggregation layer.
//!
//! Runs every strategy kind against the scanned root and merges the
//! results into one [`ScanBundle`]:
//! - config file finders, gated by their applicability probe
//! - cloud IaC extraction for the enabled providers
//! - CI/CD detection, recording failure signals
//! - the selected external scanners

pub mod bundle;
pub mod manifest;

pub use bundle::{Aggregator, ScanBundle};
pub use manifest::AggregateManifest;
