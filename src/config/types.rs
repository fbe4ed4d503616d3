//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure for posture-audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Config file discovery settings.
    pub discovery: DiscoveryConfig,
    /// Cloud IaC extraction settings.
    pub cloud: CloudConfig,
    /// CI/CD hygiene detection settings.
    pub cicd: CiCdConfig,
    /// External scanner selection and parameters.
    pub external: ExternalConfig,
}

/// Settings for the configuration file finders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum walk depth below each config root. None means unlimited.
    pub max_depth: Option<usize>,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Services to run. Empty means every registered finder.
    pub services: Vec<String>,
    /// Run `find_configuration_files` even when the applicability probe says no.
    pub ignore_applicability: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(8),
            follow_symlinks: false,
            services: Vec::new(),
            ignore_applicability: false,
        }
    }
}

impl DiscoveryConfig {
    /// Whether the finder for `service` should run.
    pub fn is_service_enabled(&self, service: &str) -> bool {
        self.services.is_empty() || self.services.iter().any(|s| s == service)
    }
}

/// Settings for cloud IaC extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Cloud providers to extract. Empty disables cloud extraction.
    pub providers: Vec<String>,
    /// Explicit credentials file handed to every enabled provider.
    pub credentials_file: Option<PathBuf>,
    /// External extraction tool invocation.
    pub tool: IacToolConfig,
}

/// How the external IaC extraction tool is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IacToolConfig {
    /// Container runtime binary.
    pub runtime: String,
    /// Image containing the extraction tool.
    pub image: String,
    /// Output format requested from the tool.
    pub destination_format: String,
    /// Path inside the container the output directory is mounted at.
    pub output_mount: String,
}

impl Default for IacToolConfig {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            image: "posture-audit/iac-extractor:latest".to_string(),
            destination_format: "terraform".to_string(),
            output_mount: "/output".to_string(),
        }
    }
}

/// Settings for CI/CD detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CiCdConfig {
    /// Maximum depth searched for pipeline definitions.
    pub max_depth: usize,
}

impl Default for CiCdConfig {
    fn default() -> Self {
        Self { max_depth: 4 }
    }
}

/// Settings for the external scan orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    /// Identifiers of the external scanners to run.
    pub selected: Vec<String>,
    /// Parameters passed to every selected scanner.
    pub parameters: BTreeMap<String, String>,
}
