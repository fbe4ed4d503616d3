//! CI/CD hygiene detection.
//!
//! Providers are checked in registration order and the first match wins.
//! When none matches, the failure signal [`NO_CI_CD_TOOL`] is produced.

pub mod providers;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::config::CiCdConfig;
use crate::registry::{Registry, default_ci_cd_providers};

/// Failure signal raised when no CI/CD configuration is found.
pub const NO_CI_CD_TOOL: &str = "cluster_no_ci_cd_tool_used";

/// Detects one CI/CD system from files below a root.
pub trait CiCdProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the system's configuration exists within `max_depth` levels.
    fn detect(&self, root: &Path, max_depth: usize) -> bool;
}

/// Result of checking every provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiCdOutcome {
    Detected(String),
    Missing(&'static str),
}

impl CiCdOutcome {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }

    /// The detected provider, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Detected(name) => Some(name.as_str()),
            Self::Missing(_) => None,
        }
    }

    /// The failure signal, if any.
    pub fn signal(&self) -> Option<&'static str> {
        match self {
            Self::Detected(_) => None,
            Self::Missing(signal) => Some(*signal),
        }
    }
}

/// Ordered, append-only list of failure signals raised during a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailedRules(Vec<String>);

impl FailedRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, signal: impl Into<String>) {
        self.0.push(signal.into());
    }

    pub fn contains(&self, signal: &str) -> bool {
        self.0.iter().any(|s| s == signal)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check every provider in `registry`, stopping at the first match.
pub fn detect_ci_cd(registry: &Registry<dyn CiCdProvider>, root: &Path, max_depth: usize) -> CiCdOutcome {
    for provider in registry.iter() {
        if provider.detect(root, max_depth) {
            info!(provider = provider.name(), "CI/CD tool detected");
            return CiCdOutcome::Detected(provider.name().to_string());
        }
        debug!(provider = provider.name(), "CI/CD tool not present");
    }
    info!(signal = NO_CI_CD_TOOL, "No CI/CD tool detected");
    CiCdOutcome::Missing(NO_CI_CD_TOOL)
}

/// Like [`detect_ci_cd`], recording the failure signal in `failed_rules`.
pub fn record_ci_cd(
    registry: &Registry<dyn CiCdProvider>,
    root: &Path,
    max_depth: usize,
    failed_rules: &mut FailedRules,
) -> CiCdOutcome {
    let outcome = detect_ci_cd(registry, root, max_depth);
    if let Some(signal) = outcome.signal() {
        failed_rules.push(signal);
    }
    outcome
}

/// Whether any built-in CI/CD provider is configured below `root`.
///
/// Appends [`NO_CI_CD_TOOL`] to `failed_rules` when none is.
pub fn is_ci_cd_there(root: &Path, failed_rules: &mut FailedRules) -> bool {
    record_ci_cd(
        &default_ci_cd_providers(),
        root,
        CiCdConfig::default().max_depth,
        failed_rules,
    )
    .is_detected()
}

macro_rules! marker_provider {
    ($name:ident, $provider:path) => {
        fn $name() -> Box<dyn CiCdProvider> {
            Box::new($provider.clone())
        }
    };
}

marker_provider!(github_actions, providers::GITHUB_ACTIONS);
marker_provider!(gitlab_ci, providers::GITLAB_CI);
marker_provider!(jenkins, providers::JENKINS);
marker_provider!(circleci, providers::CIRCLECI);
marker_provider!(azure_pipelines, providers::AZURE_PIPELINES);
marker_provider!(bitbucket_pipelines, providers::BITBUCKET_PIPELINES);
marker_provider!(travis_ci, providers::TRAVIS_CI);
marker_provider!(drone, providers::DRONE);
marker_provider!(buildkite, providers::BUILDKITE);
marker_provider!(tekton, providers::TEKTON);

/// Constructors of every built-in CI/CD provider, in check order.
pub static BUILTIN_PROVIDERS: &[fn() -> Box<dyn CiCdProvider>] = &[
    github_actions,
    gitlab_ci,
    jenkins,
    circleci,
    azure_pipelines,
    bitbucket_pipelines,
    travis_ci,
    drone,
    buildkite,
    tekton,
];
