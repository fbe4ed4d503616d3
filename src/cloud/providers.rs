//! Built-in cloud providers.
//!
//! Providers differ only in where their CLI keeps credentials and which
//! environment variable points the tool at an explicit credentials file.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::tool::CredentialMount;
use super::{CloudProvider, CredentialBundle};

/// Credential layout of one provider.
#[derive(Debug)]
pub struct CloudProfile {
    pub name: &'static str,
    /// Credentials directory relative to the user's home.
    pub home_dir: &'static str,
    /// Where that directory is mounted for the tool.
    pub home_target: &'static str,
    /// Where an explicit credentials file is mounted for the tool.
    pub file_target: &'static str,
    /// Variable pointing the tool at `file_target`.
    pub file_env: &'static str,
}

pub static AWS: CloudProfile = CloudProfile {
    name: "aws",
    home_dir: ".aws",
    home_target: "/root/.aws",
    file_target: "/root/.aws/credentials",
    file_env: "AWS_SHARED_CREDENTIALS_FILE",
};

pub static GCP: CloudProfile = CloudProfile {
    name: "gcp",
    home_dir: ".config/gcloud",
    home_target: "/root/.config/gcloud",
    file_target: "/root/.config/gcloud/application_default_credentials.json",
    file_env: "GOOGLE_APPLICATION_CREDENTIALS",
};

pub static AZURE: CloudProfile = CloudProfile {
    name: "azure",
    home_dir: ".azure",
    home_target: "/root/.azure",
    file_target: "/root/.azure/credentials.json",
    file_env: "AZURE_AUTH_LOCATION",
};

/// A provider whose credentials are found by probing the filesystem.
#[derive(Debug)]
pub struct ProfileProvider {
    profile: &'static CloudProfile,
    home: Option<PathBuf>,
}

impl ProfileProvider {
    pub fn new(profile: &'static CloudProfile) -> Self {
        Self {
            profile,
            home: dirs::home_dir(),
        }
    }

    /// Probe below `home` instead of the user's home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl CloudProvider for ProfileProvider {
    fn get_cloud_provider_name(&self) -> &str {
        self.profile.name
    }

    fn extract_credentials(&self, credentials_file: Option<&Path>) -> Option<CredentialBundle> {
        let provider = self.profile.name;

        if let Some(file) = credentials_file {
            if file.is_file() {
                debug!(provider, file = %file.display(), "Using explicit credentials file");
                return Some(
                    CredentialBundle::new(provider)
                        .with_mount(CredentialMount::new(file, self.profile.file_target))
                        .with_env(self.profile.file_env, self.profile.file_target),
                );
            }
            debug!(provider, file = %file.display(), "Explicit credentials file does not exist");
        }

        let Some(home) = &self.home else {
            debug!(provider, "No home directory to probe for credentials");
            return None;
        };
        let dir = home.join(self.profile.home_dir);
        if !dir.is_dir() {
            debug!(provider, dir = %dir.display(), "No credentials found");
            return None;
        }

        debug!(provider, dir = %dir.display(), "Found credentials directory");
        Some(CredentialBundle::new(provider).with_mount(CredentialMount::new(dir, self.profile.home_target)))
    }
}
