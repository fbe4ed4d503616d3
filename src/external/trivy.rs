//! Trivy filesystem scan (vulnerabilities, misconfigurations, secrets).

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::translate::{TranslatedFinding, str_field};
use super::{AdditionalScanProducer, ExternalCommand, ScanParameters, run_and_translate};

pub const IDENTIFIER: &str = "trivy";

#[derive(Debug, Clone)]
pub struct TrivyProducer {
    program: String,
}

impl Default for TrivyProducer {
    fn default() -> Self {
        Self {
            program: "trivy".to_string(),
        }
    }
}

impl TrivyProducer {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, root: &Path, params: &ScanParameters) -> ExternalCommand {
        let mut cmd = ExternalCommand::new(&self.program)
            .args(["fs", "--quiet", "--format", "json"])
            .arg("--scanners")
            .arg(
                params
                    .get("scanners")
                    .map(String::as_str)
                    .unwrap_or("vuln,misconfig,secret"),
            );
        if let Some(severity) = params.get("severity") {
            cmd = cmd.arg("--severity").arg(severity);
        }
        cmd.arg(root)
    }
}

impl AdditionalScanProducer for TrivyProducer {
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

/// Flatten every result section of a Trivy report.
pub fn translate(report: &Value) -> Vec<TranslatedFinding> {
    let mut findings = Vec::new();
    let Some(results) = report.get("Results").and_then(Value::as_array) else {
        return findings;
    };

    for result in results {
        let target = str_field(result, "Target");
        let section = |key: &str| {
            result
                .get(key)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        };

        for vuln in section("Vulnerabilities") {
            let package = str_field(vuln, "PkgName").unwrap_or_default();
            let version = str_field(vuln, "InstalledVersion").unwrap_or_default();
            findings.push(TranslatedFinding {
                id: str_field(vuln, "VulnerabilityID").unwrap_or_default(),
                severity: str_field(vuln, "Severity"),
                title: str_field(vuln, "Title")
                    .unwrap_or_else(|| format!("{package} {version}").trim().to_string()),
                location: target.clone(),
            });
        }
        for misconfig in section("Misconfigurations") {
            findings.push(TranslatedFinding {
                id: str_field(misconfig, "ID").unwrap_or_default(),
                severity: str_field(misconfig, "Severity"),
                title: str_field(misconfig, "Title").unwrap_or_default(),
                location: target.clone(),
            });
        }
        for secret in section("Secrets") {
            findings.push(TranslatedFinding {
                id: str_field(secret, "RuleID").unwrap_or_default(),
                severity: str_field(secret, "Severity"),
                title: str_field(secret, "Title").unwrap_or_default(),
                location: target.clone(),
            });
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_translate_all_sections() {
        let report = json!({
            "Results": [
                {
                    "Target": "usr/lib/os-release",
                    "Vulnerabilities": [{
                        "VulnerabilityID": "CVE-2024-1234",
                        "PkgName": "openssl",
                        "InstalledVersion": "3.0.1",
                        "Severity": "HIGH"
                    }]
                },
                {
                    "Target": "etc/nginx/nginx.conf",
                    "Misconfigurations": [{"ID": "NGX-001", "Title": "Server tokens on", "Severity": "LOW"}],
                    "Secrets": [{"RuleID": "aws-access-key-id", "Title": "AWS key", "Severity": "CRITICAL"}]
                }
            ]
        });

        let findings = translate(&report);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].id, "CVE-2024-1234");
        assert_eq!(findings[0].title, "openssl 3.0.1");
        assert_eq!(findings[0].location.as_deref(), Some("usr/lib/os-release"));
        assert_eq!(findings[2].severity.as_deref(), Some("CRITICAL"));
    }

    #[test]
    fn test_translate_clean_report() {
        assert!(translate(&json!({"Results": [{"Target": "x"}]})).is_empty());
        assert!(translate(&json!({})).is_empty());
    }

    #[test]
    fn test_command_uses_parameters() {
        let mut params = ScanParameters::new();
        params.insert("severity".to_string(), "HIGH,CRITICAL".to_string());

        let cmd = TrivyProducer::default().command(Path::new("/rootfs"), &params);
        let args: Vec<String> = cmd
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "fs",
                "--quiet",
                "--format",
                "json",
                "--scanners",
                "vuln,misconfig,secret",
                "--severity",
                "HIGH,CRITICAL",
                "/rootfs"
            ]
        );
    }

    #[test]
    fn test_missing_tool_yields_none() {
        let producer = TrivyProducer::with_program("posture-audit-no-such-trivy");
        assert!(producer
            .perform_external_scan_and_translation(Path::new("/"), &ScanParameters::new())
            .is_none());
    }
}
