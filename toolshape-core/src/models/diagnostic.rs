// toolshape-core/src/models/diagnostic.rs

use super::meta::RunMeta;
use crate::errors::{check_count, CountMismatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a compiler or linter message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file/line/column-located message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Result of a line-oriented compiler or linter run (tsc, gcc, mypy).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsResult {
    pub tool: String,
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub errors: usize,
    pub warnings: usize,
    pub notes: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsResult {
    /// Counts are taken from `diagnostics`; success needs a zero exit code
    /// and no errors.
    pub fn new(tool: &str, meta: RunMeta, diagnostics: Vec<Diagnostic>) -> Self {
        let errors = count_severity(&diagnostics, Severity::Error);
        let warnings = count_severity(&diagnostics, Severity::Warning);
        let notes = count_severity(&diagnostics, Severity::Note);
        let success = meta.exited_cleanly() && errors == 0;
        Self {
            tool: tool.to_string(),
            meta,
            success,
            errors,
            warnings,
            notes,
            diagnostics,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count(
            "errors",
            self.errors,
            count_severity(&self.diagnostics, Severity::Error),
        )?;
        check_count(
            "warnings",
            self.warnings,
            count_severity(&self.diagnostics, Severity::Warning),
        )?;
        check_count(
            "notes",
            self.notes,
            count_severity(&self.diagnostics, Severity::Note),
        )
    }
}

/// Result of a cargo build/check run read from its JSON message stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildResult {
    pub tool: String,
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub errors: usize,
    pub warnings: usize,
    pub artifacts: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildResult {
    /// `finished` is the in-band verdict from a `build-finished` event. When
    /// present it wins over the exit code.
    pub fn new(
        tool: &str,
        meta: RunMeta,
        diagnostics: Vec<Diagnostic>,
        artifacts: usize,
        finished: Option<bool>,
    ) -> Self {
        let errors = count_severity(&diagnostics, Severity::Error);
        let warnings = count_severity(&diagnostics, Severity::Warning);
        let success = match finished {
            Some(verdict) => verdict && !meta.timed_out,
            None => meta.exited_cleanly(),
        };
        Self {
            tool: tool.to_string(),
            meta,
            success,
            errors,
            warnings,
            artifacts,
            diagnostics,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count(
            "errors",
            self.errors,
            count_severity(&self.diagnostics, Severity::Error),
        )?;
        check_count(
            "warnings",
            self.warnings,
            count_severity(&self.diagnostics, Severity::Warning),
        )
    }
}

pub(crate) fn count_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}
