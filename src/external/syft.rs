//! Syft software bill of materials.

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::translate::{TranslatedFinding, str_field};
use super::{AdditionalScanProducer, ExternalCommand, ScanParameters, run_and_translate};

pub const IDENTIFIER: &str = "syft";

#[derive(Debug, Clone)]
pub struct SyftProducer {
    program: String,
}

impl Default for SyftProducer {
    fn default() -> Self {
        Self {
            program: "syft".to_string(),
        }
    }
}

impl SyftProducer {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, root: &Path, params: &ScanParameters) -> ExternalCommand {
        let mut cmd = ExternalCommand::new(&self.program)
            .args(["scan", "--quiet", "--output", "json"]);
        if let Some(scope) = params.get("scope") {
            cmd = cmd.arg("--scope").arg(scope);
        }
        cmd.arg(format!("dir:{}", root.display()))
    }
}

impl AdditionalScanProducer for SyftProducer {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn perform_external_scan_and_translation(
        &self,
        root: &Path,
        params: &ScanParameters,
    ) -> Option<PathBuf> {
        run_and_translate(IDENTIFIER, root, &self.command(root, params), &[], translate)
    }
}

/// One entry per catalogued package.
pub fn translate(report: &Value) -> Vec<TranslatedFinding> {
    report
        .get("artifacts")
        .and_then(Value::as_array)
        .map(|artifacts| {
            artifacts
                .iter()
                .filter_map(|artifact| {
                    let name = str_field(artifact, "name")?;
                    let version = str_field(artifact, "version").unwrap_or_default();
                    Some(TranslatedFinding {
                        id: str_field(artifact, "purl")
                            .unwrap_or_else(|| format!("{name}@{version}")),
                        severity: None,
                        title: format!("{name} {version}").trim().to_string(),
                        location: str_field(artifact, "type"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
