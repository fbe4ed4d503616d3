//! The external IaC extraction tool.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::config::IacToolConfig;
use crate::error::ToolError;

/// A credential file or directory made visible to the tool read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialMount {
    /// Path on the host.
    pub host: PathBuf,
    /// Path inside the tool's environment.
    pub target: String,
}

impl CredentialMount {
    pub fn new(host: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            target: target.into(),
        }
    }
}

/// One extraction request.
#[derive(Debug, Clone)]
pub struct IacInvocation {
    /// Provider the infrastructure is exported from.
    pub source_provider: String,
    /// Requested IaC dialect, e.g. `terraform`.
    pub destination_format: String,
    /// Host directory receiving the exported files.
    pub output_dir: PathBuf,
    pub env: Vec<(String, String)>,
    pub mounts: Vec<CredentialMount>,
}

/// How the tool process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Exit code, `None` when killed by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Exports a cloud account as infrastructure-as-code.
pub trait IacExtractionTool {
    /// Run the tool once; `Err` only when it could not be started.
    fn run(&self, invocation: &IacInvocation) -> Result<ToolOutcome, ToolError>;
}

/// Runs the extraction tool image through a container runtime.
#[derive(Debug, Clone)]
pub struct ContainerIacTool {
    config: IacToolConfig,
}

impl ContainerIacTool {
    pub fn new(config: IacToolConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the container runtime.
    pub fn args(&self, invocation: &IacInvocation) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        for (key, value) in &invocation.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        for mount in &invocation.mounts {
            args.push("-v".to_string());
            args.push(format!("{}:{}:ro", mount.host.display(), mount.target));
        }
        args.push("-v".to_string());
        args.push(format!(
            "{}:{}",
            invocation.output_dir.display(),
            self.config.output_mount
        ));

        args.push(self.config.image.clone());
        args.extend([
            "--source".to_string(),
            invocation.source_provider.clone(),
            "--target".to_string(),
            invocation.destination_format.clone(),
            "--output".to_string(),
            self.config.output_mount.clone(),
        ]);
        args
    }
}

impl IacExtractionTool for ContainerIacTool {
    fn run(&self, invocation: &IacInvocation) -> Result<ToolOutcome, ToolError> {
        let program = &self.config.runtime;
        let args = self.args(invocation);
        debug!(program = %program, image = %self.config.image, provider = %invocation.source_provider, "Running IaC extraction");

        let output = Command::new(program)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::NotFound {
                    program: program.clone(),
                },
                _ => ToolError::Spawn {
                    program: program.clone(),
                    source: e,
                },
            })?;

        Ok(ToolOutcome {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> IacInvocation {
        IacInvocation {
            source_provider: "aws".to_string(),
            destination_format: "terraform".to_string(),
            output_dir: PathBuf::from("/tmp/out"),
            env: vec![("CLOUD_PROVIDER".to_string(), "aws".to_string())],
            mounts: vec![CredentialMount::new("/home/u/.aws", "/root/.aws")],
        }
    }

    #[test]
    fn test_container_args() {
        let tool = ContainerIacTool::new(IacToolConfig::default());
        let args = tool.args(&invocation());

        assert_eq!(
            args,
            vec![
                "run",
                "--rm",
                "-e",
                "CLOUD_PROVIDER=aws",
                "-v",
                "/home/u/.aws:/root/.aws:ro",
                "-v",
                "/tmp/out:/output",
                "posture-audit/iac-extractor:latest",
                "--source",
                "aws",
                "--target",
                "terraform",
                "--output",
                "/output",
            ]
        );
    }

    #[test]
    fn test_missing_runtime_is_not_found() {
        let tool = ContainerIacTool::new(IacToolConfig {
            runtime: "posture-audit-no-such-runtime".to_string(),
            ..IacToolConfig::default()
        });
        assert!(matches!(
            tool.run(&invocation()),
            Err(ToolError::NotFound { .. })
        ));
    }

    #[test]
    fn test_outcome_success() {
        let ok = ToolOutcome {
            exit_code: Some(0),
            stderr: String::new(),
        };
        let killed = ToolOutcome {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(!killed.success());
    }
}
