// toolshape-core/src/parsers/cargo.rs

//! `cargo build --message-format=json` / `cargo check --message-format=json`.

use super::{RawOutput, ToolParser};
use crate::assemble::dedup_exact;
use crate::errors::ParseError;
use crate::models::diagnostic::{BuildResult, Diagnostic, Severity};
use crate::tokenize::json_lines;
use serde::Deserialize;
use tracing::{debug, trace};

/// The message kinds cargo streams, keyed on `reason`. Anything else lands
/// in `Other` and is ignored.
#[derive(Deserialize, Debug)]
#[serde(tag = "reason", rename_all = "kebab-case")]
enum CargoMessage {
    CompilerMessage { message: RustcDiagnostic },
    CompilerArtifact {},
    BuildScriptExecuted {},
    BuildFinished { success: bool },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
struct RustcDiagnostic {
    message: String,
    #[serde(default)]
    code: Option<RustcCode>,
    level: String,
    #[serde(default)]
    spans: Vec<RustcSpan>,
    #[serde(default)]
    children: Vec<RustcDiagnostic>,
}

#[derive(Deserialize, Debug)]
struct RustcCode {
    code: String,
}

#[derive(Deserialize, Debug)]
struct RustcSpan {
    file_name: String,
    line_start: u32,
    column_start: u32,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    suggested_replacement: Option<String>,
}

fn rustc_severity(level: &str) -> Severity {
    match level {
        "error" | "error: internal compiler error" => Severity::Error,
        "warning" => Severity::Warning,
        "note" | "failure-note" => Severity::Note,
        "help" => Severity::Help,
        _ => Severity::Warning,
    }
}

/// Folds `help`/`note` children into one suggestion string. A child's
/// replacement text is appended in backticks.
fn hoist_children(children: &[RustcDiagnostic]) -> Option<String> {
    let parts: Vec<String> = children
        .iter()
        .filter(|c| matches!(c.level.as_str(), "help" | "note"))
        .map(|c| {
            let replacement = c
                .spans
                .iter()
                .find_map(|s| s.suggested_replacement.as_deref());
            match replacement {
                Some(r) => format!("{}: `{}`", c.message, r),
                None => c.message.clone(),
            }
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn to_diagnostic(d: RustcDiagnostic) -> Option<Diagnostic> {
    let span = d
        .spans
        .iter()
        .find(|s| s.is_primary)
        .or_else(|| d.spans.first())?;
    if span.line_start == 0 || span.column_start == 0 {
        return None;
    }
    Some(Diagnostic {
        file: span.file_name.clone(),
        line: span.line_start,
        column: span.column_start,
        severity: rustc_severity(&d.level),
        code: d.code.as_ref().map(|c| c.code.clone()),
        suggestion: hoist_children(&d.children),
        message: d.message,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CargoBuildParser;

impl ToolParser for CargoBuildParser {
    type Output = BuildResult;

    fn tool(&self) -> &'static str {
        "cargo build"
    }

    fn parse(&self, raw: &RawOutput) -> Result<BuildResult, ParseError> {
        let mut diagnostics = Vec::new();
        let mut artifacts = 0;
        let mut finished = None;
        for message in json_lines::<CargoMessage>(&raw.stdout) {
            match message {
                CargoMessage::CompilerMessage { message } => match to_diagnostic(message) {
                    Some(d) => diagnostics.push(d),
                    None => trace!("Dropping compiler message without a span"),
                },
                CargoMessage::CompilerArtifact {} => artifacts += 1,
                CargoMessage::BuildFinished { success } => finished = Some(success),
                CargoMessage::BuildScriptExecuted {} | CargoMessage::Other => {}
            }
        }
        let diagnostics = dedup_exact(diagnostics);
        debug!(
            count = diagnostics.len(),
            artifacts,
            finished = ?finished,
            "Parsed cargo message stream"
        );
        Ok(BuildResult::new(
            self.tool(),
            raw.meta(),
            diagnostics,
            artifacts,
            finished,
        ))
    }
}
