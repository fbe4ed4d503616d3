//! Cloud IaC extraction.
//!
//! A provider probes for ambient credentials and, when it finds some, runs
//! the IaC extraction tool once against the account they belong to. The
//! exported files land in a fresh temporary directory handed to the caller.

pub mod providers;
pub mod tool;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::CloudConfig;
pub use providers::{CloudProfile, ProfileProvider};
pub use tool::{ContainerIacTool, CredentialMount, IacExtractionTool, IacInvocation, ToolOutcome};

/// Environment variable naming the provider for the extraction tool.
pub const PROVIDER_ENV: &str = "CLOUD_PROVIDER";

/// Credentials located for one provider. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    pub provider: String,
    pub mounts: Vec<CredentialMount>,
    /// Provider-specific environment on top of [`PROVIDER_ENV`].
    pub env: Vec<(String, String)>,
}

impl CredentialBundle {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            mounts: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn with_mount(mut self, mount: CredentialMount) -> Self {
        self.mounts.push(mount);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Exports a cloud account as infrastructure-as-code.
pub trait CloudProvider: Send + Sync {
    fn get_cloud_provider_name(&self) -> &str;

    /// Locate credentials. An existing `credentials_file` wins over the
    /// provider's conventional directory; only existence is checked.
    fn extract_credentials(&self, credentials_file: Option<&Path>) -> Option<CredentialBundle>;

    /// Run the configured extraction tool for this provider's account.
    fn extract_iac_files_for_account(
        &self,
        config: &CloudConfig,
        credentials_file: Option<&Path>,
    ) -> Option<PathBuf> {
        let tool = ContainerIacTool::new(config.tool.clone());
        extract_with_tool(self, &tool, &config.tool.destination_format, credentials_file)
    }
}

/// Extract IaC for `provider` through `tool`.
///
/// The tool is not invoked when no credentials are found. Returns the
/// output directory only when the tool succeeded and wrote something.
pub fn extract_with_tool<P>(
    provider: &P,
    tool: &dyn IacExtractionTool,
    destination_format: &str,
    credentials_file: Option<&Path>,
) -> Option<PathBuf>
where
    P: CloudProvider + ?Sized,
{
    let name = provider.get_cloud_provider_name();
    let Some(credentials) = provider.extract_credentials(credentials_file) else {
        debug!(provider = name, "No credentials, skipping IaC extraction");
        return None;
    };

    let output = match tempfile::Builder::new()
        .prefix(&format!("posture-audit-iac-{name}-"))
        .tempdir()
    {
        Ok(dir) => dir,
        Err(e) => {
            warn!(provider = name, error = %e, "Cannot create IaC output directory");
            return None;
        }
    };

    let mut env = vec![(PROVIDER_ENV.to_string(), name.to_string())];
    env.extend(credentials.env);
    let invocation = IacInvocation {
        source_provider: name.to_string(),
        destination_format: destination_format.to_string(),
        output_dir: output.path().to_path_buf(),
        env,
        mounts: credentials.mounts,
    };

    match tool.run(&invocation) {
        Ok(outcome) if outcome.success() => {}
        Ok(outcome) => {
            warn!(provider = name, exit_code = ?outcome.exit_code, stderr = %outcome.stderr, "IaC extraction failed");
            return None;
        }
        Err(e) => {
            warn!(provider = name, error = %e, "IaC extraction tool could not be started");
            return None;
        }
    }

    let produced = fs::read_dir(output.path())
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if !produced {
        warn!(provider = name, "IaC extraction produced no files");
        return None;
    }

    let dir = output.keep();
    info!(provider = name, dir = %dir.display(), "Extracted IaC files");
    Some(dir)
}

fn aws() -> Box<dyn CloudProvider> {
    Box::new(ProfileProvider::new(&providers::AWS))
}

fn gcp() -> Box<dyn CloudProvider> {
    Box::new(ProfileProvider::new(&providers::GCP))
}

fn azure() -> Box<dyn CloudProvider> {
    Box::new(ProfileProvider::new(&providers::AZURE))
}

/// Constructors of every built-in cloud provider.
pub static BUILTIN_PROVIDERS: &[fn() -> Box<dyn CloudProvider>] = &[aws, gcp, azure];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records invocations and optionally writes a file into the output dir.
    struct FakeTool {
        calls: RefCell<Vec<IacInvocation>>,
        exit_code: Option<i32>,
        writes: bool,
    }

    impl FakeTool {
        fn new(exit_code: Option<i32>, writes: bool) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                exit_code,
                writes,
            }
        }
    }

    impl IacExtractionTool for FakeTool {
        fn run(&self, invocation: &IacInvocation) -> Result<ToolOutcome, ToolError> {
            self.calls.borrow_mut().push(invocation.clone());
            if self.writes {
                fs::write(invocation.output_dir.join("main.tf"), "resource {}").unwrap();
            }
            Ok(ToolOutcome {
                exit_code: self.exit_code,
                stderr: String::new(),
            })
        }
    }

    struct BrokenTool;

    impl IacExtractionTool for BrokenTool {
        fn run(&self, _invocation: &IacInvocation) -> Result<ToolOutcome, ToolError> {
            Err(ToolError::NotFound {
                program: "docker".to_string(),
            })
        }
    }

    fn provider_with_credentials() -> (TempDir, ProfileProvider) {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".aws")).unwrap();
        let provider = ProfileProvider::new(&providers::AWS).with_home(home.path());
        (home, provider)
    }

    #[test]
    fn test_no_credentials_never_invokes_tool() {
        let home = TempDir::new().unwrap();
        let provider = ProfileProvider::new(&providers::AWS).with_home(home.path());
        let tool = FakeTool::new(Some(0), true);

        assert!(extract_with_tool(&provider, &tool, "terraform", None).is_none());
        assert!(tool.calls.borrow().is_empty());
    }

    #[test]
    fn test_successful_extraction() {
        let (home, provider) = provider_with_credentials();
        let tool = FakeTool::new(Some(0), true);

        let dir = extract_with_tool(&provider, &tool, "terraform", None).unwrap();
        assert!(dir.join("main.tf").is_file());

        let calls = tool.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source_provider, "aws");
        assert_eq!(calls[0].destination_format, "terraform");
        assert!(calls[0]
            .env
            .contains(&(PROVIDER_ENV.to_string(), "aws".to_string())));
        assert_eq!(calls[0].mounts[0].host, home.path().join(".aws"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_failed_tool_yields_none() {
        let (_home, provider) = provider_with_credentials();
        let tool = FakeTool::new(Some(1), true);

        assert!(extract_with_tool(&provider, &tool, "terraform", None).is_none());
        // The output directory is removed again
        let output = tool.calls.borrow()[0].output_dir.clone();
        assert!(!output.exists());
    }

    #[test]
    fn test_empty_output_yields_none() {
        let (_home, provider) = provider_with_credentials();
        let tool = FakeTool::new(Some(0), false);
        assert!(extract_with_tool(&provider, &tool, "terraform", None).is_none());
    }

    #[test]
    fn test_spawn_failure_yields_none() {
        let (_home, provider) = provider_with_credentials();
        assert!(extract_with_tool(&provider, &BrokenTool, "terraform", None).is_none());
    }

    #[test]
    fn test_builtin_provider_names() {
        let names: Vec<String> = BUILTIN_PROVIDERS
            .iter()
            .map(|ctor| ctor().get_cloud_provider_name().to_string())
            .collect();
        assert_eq!(names, vec!["aws", "gcp", "azure"]);
    }
}
