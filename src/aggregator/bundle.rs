//! Running every strategy kind against one root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::AggregateManifest;
use crate::cicd::{self, CiCdProvider, FailedRules};
use crate::cloud::CloudProvider;
use crate::config::Config;
use crate::error::{PostureError, Result};
use crate::external::{self, AdditionalScanProducer};
use crate::finders::ConfigFileFinder;
use crate::registry::{
    Registry, default_additional_scan_producers, default_ci_cd_providers,
    default_cloud_providers, default_config_file_finders,
};

/// Everything one scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanBundle {
    pub target: PathBuf,
    pub scanned_at: DateTime<Utc>,
    /// Staging directory per service.
    pub config_files: AggregateManifest,
    /// IaC export directory per cloud provider.
    pub cloud: AggregateManifest,
    /// Translated output directory per external scanner.
    pub additional_scans: AggregateManifest,
    pub ci_cd_tool: Option<String>,
    pub failed_rules: FailedRules,
}

impl ScanBundle {
    /// Every directory the scan created.
    pub fn produced_dirs(&self) -> impl Iterator<Item = &Path> {
        self.config_files
            .paths()
            .chain(self.cloud.paths())
            .chain(self.additional_scans.paths())
    }

    /// Number of manifest entries across all kinds.
    pub fn entry_count(&self) -> usize {
        self.config_files.len() + self.cloud.len() + self.additional_scans.len()
    }
}

/// Owns the strategy registries and runs them in a fixed order.
pub struct Aggregator {
    config: Config,
    finders: Registry<dyn ConfigFileFinder>,
    clouds: Registry<dyn CloudProvider>,
    ci_cd: Registry<dyn CiCdProvider>,
    producers: Registry<dyn AdditionalScanProducer>,
}

impl Aggregator {
    /// Aggregator over every built-in strategy.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            finders: default_config_file_finders(),
            clouds: default_cloud_providers(),
            ci_cd: default_ci_cd_providers(),
            producers: default_additional_scan_producers(),
        }
    }

    pub fn with_finders(mut self, finders: Registry<dyn ConfigFileFinder>) -> Self {
        self.finders = finders;
        self
    }

    pub fn with_cloud_providers(mut self, clouds: Registry<dyn CloudProvider>) -> Self {
        self.clouds = clouds;
        self
    }

    pub fn with_ci_cd_providers(mut self, ci_cd: Registry<dyn CiCdProvider>) -> Self {
        self.ci_cd = ci_cd;
        self
    }

    pub fn with_producers(mut self, producers: Registry<dyn AdditionalScanProducer>) -> Self {
        self.producers = producers;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan `root`. Only an invalid root is an error; strategy failures
    /// show up as missing manifest entries.
    pub fn run(&self, root: &Path) -> Result<ScanBundle> {
        let root = validate_root(root)?;
        info!(root = %root.display(), "Starting scan");

        let config_files = self.find_config_files(&root);
        let cloud = self.extract_cloud();

        let mut failed_rules = FailedRules::new();
        let ci_cd_tool = cicd::record_ci_cd(
            &self.ci_cd,
            &root,
            self.config.cicd.max_depth,
            &mut failed_rules,
        )
        .provider()
        .map(str::to_string);

        let additional_scans = external::perform_external_scans_and_return_folders(
            &self.producers,
            &root,
            &self.config.external.parameters,
            &self.config.external.selected,
        );

        let bundle = ScanBundle {
            target: root,
            scanned_at: Utc::now(),
            config_files,
            cloud,
            additional_scans,
            ci_cd_tool,
            failed_rules,
        };
        info!(
            entries = bundle.entry_count(),
            failed_rules = bundle.failed_rules.len(),
            "Scan finished"
        );
        Ok(bundle)
    }

    fn find_config_files(&self, root: &Path) -> AggregateManifest {
        let discovery = &self.config.discovery;
        let mut manifest = AggregateManifest::new();

        for mut finder in self.finders.iter() {
            let service = finder.service_name().to_string();
            if !discovery.is_service_enabled(&service) {
                debug!(service = %service, "Service not selected");
                continue;
            }
            finder.configure(discovery);

            let applicability = finder.check_applicability(root);
            if !applicability.is_applicable() && !discovery.ignore_applicability {
                debug!(service = %service, "Service not applicable");
                continue;
            }
            debug!(service = %service, ?applicability, "Searching configuration files");

            if let Some(dir) = finder.find_configuration_files(root) {
                manifest.insert(self.finders.kind(), service, dir);
            }
        }
        manifest
    }

    fn extract_cloud(&self) -> AggregateManifest {
        let cloud = &self.config.cloud;
        let mut manifest = AggregateManifest::new();
        if cloud.providers.is_empty() {
            return manifest;
        }

        let mut seen = Vec::new();
        for provider in self.clouds.iter() {
            let name = provider.get_cloud_provider_name().to_string();
            if !cloud.providers.contains(&name) {
                continue;
            }
            seen.push(name.clone());

            if let Some(dir) =
                provider.extract_iac_files_for_account(cloud, cloud.credentials_file.as_deref())
            {
                manifest.insert(self.clouds.kind(), name, dir);
            }
        }

        for name in cloud.providers.iter().filter(|n| !seen.contains(n)) {
            warn!(provider = %name, "Unknown cloud provider");
        }
        manifest
    }
}

fn validate_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(PostureError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(PostureError::NotADirectory(root.to_path_buf()));
    }
    root.canonicalize()
        .map_err(|e| PostureError::io(root, crate::error::IoOperation::Read, e))
}
