//! Subprocess runner shared by the external scanners.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::process::Command;
use tracing::debug;

use crate::error::ToolError;

/// A command line for one external scanner run.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<OsString>,
    env: Vec<(String, String)>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Run to completion and return stdout.
    ///
    /// `accepted_codes` lists exit codes besides 0 that still mean the tool
    /// produced its report (scanners often exit 1 when they find something).
    pub fn run(&self, accepted_codes: &[i32]) -> Result<Vec<u8>, ToolError> {
        debug!(program = %self.program, args = ?self.args, "Running external scanner");

        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::NotFound {
                    program: self.program.clone(),
                },
                _ => ToolError::Spawn {
                    program: self.program.clone(),
                    source: e,
                },
            })?;

        let code = output.status.code();
        if code == Some(0) || code.is_some_and(|c| accepted_codes.contains(&c)) {
            return Ok(output.stdout);
        }

        Err(ToolError::Failed {
            program: self.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
