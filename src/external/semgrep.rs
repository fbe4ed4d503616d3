//! Semgrep static analysis.

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::translate::{TranslatedFinding, str_field};
use super::{AdditionalScanProducer, ExternalCommand, ScanParameters, run_and_translate};

pub const IDENTIFIER: &str = "semgrep";

/// With `--error` semgrep exits 1 whenever it reports findings.
const FINDINGS_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone)]
pub struct SemgrepProducer {
    program: String,
}

impl Default for SemgrepProducer {
    fn default() -> Self {
        Self {
            program: "semgrep".to_string(),
        }
    }
}

impl SemgrepProducer {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, root: &Path, params: &ScanParameters) -> ExternalCommand {
        ExternalCommand::new(&self.program)
            .args(["scan", "--json", "--quiet", "--error", "--metrics=off", "--config"])
            .arg(params.get("config").map(String::as_str).unwrap_or("auto"))
            .arg(root)
            .env("SEMGREP_SEND_METRICS", "off")
    }
}

impl AdditionalScanProducer for SemgrepProducer {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn perform_external_scan_and_translation(
        &self,
        root: &Path,
        params: &ScanParameters,
    ) -> Option<PathBuf> {
        run_and_translate(
            IDENTIFIER,
            root,
            &self.command(root, params),
            &[FINDINGS_EXIT_CODE],
            translate,
        )
    }
}

pub fn translate(report: &Value) -> Vec<TranslatedFinding> {
    let Some(results) = report.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .map(|result| {
            let extra = result.get("extra");
            let line = result
                .get("start")
                .and_then(|s| s.get("line"))
                .and_then(Value::as_u64);
            let location = str_field(result, "path").map(|path| match line {
                Some(line) => format!("{path}:{line}"),
                None => path,
            });
            TranslatedFinding {
                id: str_field(result, "check_id").unwrap_or_default(),
                severity: extra.and_then(|e| str_field(e, "severity")),
                title: extra
                    .and_then(|e| str_field(e, "message"))
                    .unwrap_or_default(),
                location,
            }
        })
        .collect()
}
