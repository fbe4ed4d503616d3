//! External scan orchestration.
//!
//! Third-party scanners run against the scanned root, each into its own
//! temporary directory, and their raw output is translated into a common
//! `translated.json` shape. Only the scanners the caller selected run.

pub mod runner;
pub mod semgrep;
pub mod syft;
pub mod translate;
pub mod trivy;

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::aggregator::AggregateManifest;
use crate::error::{IoOperation, PostureError, Result};
use crate::registry::Registry;
pub use runner::ExternalCommand;
pub use semgrep::SemgrepProducer;
pub use syft::SyftProducer;
pub use translate::{TRANSLATED_FILE, TranslatedFinding, TranslatedReport};
pub use trivy::TrivyProducer;

/// Key/value parameters handed to every selected scanner.
pub type ScanParameters = BTreeMap<String, String>;

/// File name of the untranslated tool output.
pub const RAW_FILE: &str = "raw.json";

/// Runs one third-party scanner and translates its output.
pub trait AdditionalScanProducer: Send + Sync {
    fn identifier(&self) -> &str;

    /// Scan `root` and return the directory holding the translated output,
    /// or `None` when the tool failed or found nothing.
    fn perform_external_scan_and_translation(
        &self,
        root: &Path,
        params: &ScanParameters,
    ) -> Option<PathBuf>;
}

/// Run every registered producer whose identifier is in `selected`.
///
/// Producers that return `None` are left out of the manifest. Unselected
/// producers are never invoked.
pub fn perform_external_scans_and_return_folders(
    registry: &Registry<dyn AdditionalScanProducer>,
    root: &Path,
    params: &ScanParameters,
    selected: &[String],
) -> AggregateManifest {
    let mut manifest = AggregateManifest::new();
    if selected.is_empty() {
        return manifest;
    }

    let mut seen = Vec::new();
    for producer in registry.iter() {
        let id = producer.identifier().to_string();
        if !selected.contains(&id) {
            continue;
        }
        seen.push(id.clone());

        match producer.perform_external_scan_and_translation(root, params) {
            Some(dir) => manifest.insert(registry.kind(), id, dir),
            None => debug!(scanner = %id, "External scanner produced nothing"),
        }
    }

    for id in selected.iter().filter(|id| !seen.contains(id)) {
        warn!(scanner = %id, "Selected scanner is not registered");
    }
    manifest
}

/// Run `command`, store its JSON output and translate it into a fresh
/// directory named after `scanner`.
pub(crate) fn run_and_translate(
    scanner: &str,
    root: &Path,
    command: &ExternalCommand,
    accepted_codes: &[i32],
    translate: fn(&Value) -> Vec<TranslatedFinding>,
) -> Option<PathBuf> {
    let dir = match tempfile::Builder::new()
        .prefix(&format!("posture-audit-{scanner}-"))
        .tempdir()
    {
        Ok(dir) => dir,
        Err(e) => {
            warn!(scanner, error = %e, "Cannot create scanner output directory");
            return None;
        }
    };

    match scan_into(scanner, root, dir.path(), command, accepted_codes, translate) {
        Ok(0) => {
            info!(scanner, "External scanner reported no findings");
            None
        }
        Ok(count) => {
            let dir = dir.keep();
            info!(scanner, findings = count, dir = %dir.display(), "External scan translated");
            Some(dir)
        }
        Err(e) => {
            warn!(scanner, error = %e, "External scan failed");
            None
        }
    }
}

fn scan_into(
    scanner: &str,
    root: &Path,
    dir: &Path,
    command: &ExternalCommand,
    accepted_codes: &[i32],
    translate: fn(&Value) -> Vec<TranslatedFinding>,
) -> Result<usize> {
    let stdout = command.run(accepted_codes)?;

    let raw_path = dir.join(RAW_FILE);
    fs::write(&raw_path, &stdout).map_err(|e| PostureError::io(&raw_path, IoOperation::Write, e))?;

    let raw: Value =
        serde_json::from_slice(&stdout).map_err(|e| PostureError::json_parse(&raw_path, e))?;
    let findings = translate(&raw);
    let count = findings.len();
    if count > 0 {
        TranslatedReport::new(scanner, root, findings).write_to(dir)?;
    }
    Ok(count)
}

fn trivy_producer() -> Box<dyn AdditionalScanProducer> {
    Box::new(TrivyProducer::default())
}

fn syft_producer() -> Box<dyn AdditionalScanProducer> {
    Box::new(SyftProducer::default())
}

fn semgrep_producer() -> Box<dyn AdditionalScanProducer> {
    Box::new(SemgrepProducer::default())
}

/// Constructors of every built-in external scanner.
pub static BUILTIN_PRODUCERS: &[fn() -> Box<dyn AdditionalScanProducer>] =
    &[trivy_producer, syft_producer, semgrep_producer];
