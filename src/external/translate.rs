//! Normalised output written by every external scanner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoOperation, PostureError, Result};

/// File name of the translated report inside a scanner's output directory.
pub const TRANSLATED_FILE: &str = "translated.json";

/// One normalised finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedFinding {
    /// Rule, advisory or component identifier.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    pub title: String,
    /// File, package or target the finding belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A scanner report in the common shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedReport {
    pub scanner: String,
    pub target: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub findings: Vec<TranslatedFinding>,
}

impl TranslatedReport {
    pub fn new(scanner: &str, target: &Path, findings: Vec<TranslatedFinding>) -> Self {
        Self {
            scanner: scanner.to_string(),
            target: target.to_path_buf(),
            generated_at: Utc::now(),
            findings,
        }
    }

    /// Write the report as `translated.json` into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(TRANSLATED_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| PostureError::io(&path, IoOperation::Write, e))?;
        Ok(path)
    }
}

/// Read a string field from a JSON object.
pub(crate) fn str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}
