//! CLI flags layered over a loaded configuration.

use super::error::ConfigError;
use super::types::Config;
use crate::Cli;

/// Split a `key=value` scanner parameter.
pub fn parse_parameter(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidParameter(raw.to_string())),
    }
}

impl Config {
    /// Apply CLI overrides. List flags replace the configured list when given.
    pub fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if !cli.services.is_empty() {
            self.discovery.services = cli.services.clone();
        }
        if !cli.cloud_providers.is_empty() {
            self.cloud.providers = cli.cloud_providers.clone();
        }
        if let Some(ref file) = cli.credentials_file {
            self.cloud.credentials_file = Some(file.clone());
        }
        if !cli.additional_scanners.is_empty() {
            self.external.selected = cli.additional_scanners.clone();
        }
        for raw in &cli.params {
            let (key, value) = parse_parameter(raw)?;
            self.external.parameters.insert(key, value);
        }
        Ok(())
    }
}
