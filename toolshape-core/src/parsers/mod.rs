// toolshape-core/src/parsers/mod.rs

//! One converter per supported tool.
//!
//! Every converter implements [`ToolParser`]: it takes the captured
//! [`RawOutput`] of one run and returns that tool's Result type. Converters
//! hold nothing but their options, never touch the filesystem and never
//! spawn processes. Running the tool and collecting its output is the
//! caller's job.

pub mod audit;
pub mod cargo;
pub mod compiler;
pub mod coverage;
pub mod docker;
pub mod gh;
pub mod git;
pub mod gotest;
pub mod tree;

use crate::compact::{shape, Compact, ShapeKind};
use crate::errors::ParseError;
use crate::models::meta::RunMeta;
use serde::Serialize;
use tracing::debug;

/// Captured output of one tool run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawOutput {
    /// The exit status code of the command.
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
    /// Wall-clock seconds the run took.
    pub elapsed: f64,
    pub timed_out: bool,
    /// Set when stdout or stderr was cut by [`RawOutput::with_limit`].
    pub truncated: bool,
}

impl RawOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.elapsed = seconds;
        self
    }

    pub fn with_timed_out(mut self, timed_out: bool) -> Self {
        self.timed_out = timed_out;
        self
    }

    /// Cuts stdout and stderr to at most `max_bytes` bytes each, on a char
    /// boundary. Must run before parsing so that parsers only ever see what
    /// the Result will report as seen.
    pub fn with_limit(mut self, max_bytes: usize) -> Self {
        let cut_out = truncate_in_place(&mut self.stdout, max_bytes);
        let cut_err = truncate_in_place(&mut self.stderr, max_bytes);
        if cut_out || cut_err {
            debug!(max_bytes, cut_out, cut_err, "Truncated captured output");
            self.truncated = true;
        }
        self
    }

    /// Checks if the command executed successfully (status code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    pub fn meta(&self) -> RunMeta {
        RunMeta {
            exit_code: self.exit_code,
            duration: if self.elapsed > 0.0 {
                Some(self.elapsed)
            } else {
                None
            },
            truncated: self.truncated,
            timed_out: self.timed_out,
        }
    }

    /// Total captured bytes, the baseline the compactor measures against.
    pub fn len(&self) -> usize {
        self.stdout.len() + self.stderr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn truncate_in_place(text: &mut String, max_bytes: usize) -> bool {
    if text.len() <= max_bytes {
        return false;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    true
}

/// A converter from one tool's raw output to its Result.
pub trait ToolParser {
    type Output: Serialize;

    /// Tool name as it appears in Results and summaries.
    fn tool(&self) -> &'static str;

    fn parse(&self, raw: &RawOutput) -> Result<Self::Output, ParseError>;
}

/// Every tool this crate can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    Tsc,
    Gcc,
    Mypy,
    CargoBuild,
    GoTest,
    GitLog,
    GitStatus,
    GitDiff,
    CargoAudit,
    Coverage,
    CargoTree,
    DockerPs,
    DockerImages,
    GhChecks,
}

impl ToolKind {
    /// Program and fixed leading arguments that produce the format each
    /// converter expects. Caller arguments go after these.
    pub fn command_prefix(&self, options: &ParseOptions) -> (&'static str, Vec<String>) {
        let args: &[&str] = match self {
            ToolKind::Tsc => &["--noEmit", "--pretty", "false"],
            ToolKind::Gcc => &["-fsyntax-only", "-fdiagnostics-color=never"],
            ToolKind::Mypy => &["--show-column-numbers", "--no-pretty", "--no-color-output"],
            ToolKind::CargoBuild => &["build", "--message-format=json"],
            ToolKind::GoTest => &["test", "-json"],
            ToolKind::GitLog => &[],
            ToolKind::GitStatus => &["status", "--porcelain=v1", "--branch"],
            ToolKind::GitDiff => &["diff", "--numstat", "-M"],
            ToolKind::CargoAudit => &["audit", "--json"],
            ToolKind::Coverage => &["nyc", "report", "--reporter=text"],
            ToolKind::CargoTree => &["tree"],
            ToolKind::DockerPs => &["ps", "-a", "--no-trunc"],
            ToolKind::DockerImages => &["images"],
            ToolKind::GhChecks => &["pr", "checks"],
        };
        let program = match self {
            ToolKind::Tsc => "tsc",
            ToolKind::Gcc => "gcc",
            ToolKind::Mypy => "mypy",
            ToolKind::CargoBuild | ToolKind::CargoAudit | ToolKind::CargoTree => "cargo",
            ToolKind::GoTest => "go",
            ToolKind::GitLog | ToolKind::GitStatus | ToolKind::GitDiff => "git",
            ToolKind::Coverage => "npx",
            ToolKind::DockerPs | ToolKind::DockerImages => "docker",
            ToolKind::GhChecks => "gh",
        };
        let mut args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        if *self == ToolKind::GitLog {
            args = git::GitLogParser::new(options.log_delimiter.clone()).command_args();
        }
        (program, args)
    }
}

/// Options that change how a converter reads its input or how the result
/// is shaped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub log_delimiter: String,
    /// Always return the full record, even when compact would be chosen.
    pub prefer_full: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            log_delimiter: git::DEFAULT_LOG_DELIMITER.to_string(),
            prefer_full: false,
        }
    }
}

/// A parsed, shaped Result ready to hand to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub shape: ShapeKind,
    /// `{"shape": ..., "data": ...}` JSON value.
    pub value: serde_json::Value,
    pub summary: String,
    pub success: bool,
}

/// Parses `raw` with the converter for `kind` and shapes the outcome.
pub fn parse_any(
    kind: ToolKind,
    raw: &RawOutput,
    options: &ParseOptions,
) -> Result<Rendered, ParseError> {
    match kind {
        ToolKind::Tsc => render(&compiler::TscParser, raw, options),
        ToolKind::Gcc => render(&compiler::GccParser, raw, options),
        ToolKind::Mypy => render(&compiler::MypyParser, raw, options),
        ToolKind::CargoBuild => render(&cargo::CargoBuildParser, raw, options),
        ToolKind::GoTest => render(&gotest::GoTestParser, raw, options),
        ToolKind::GitLog => render(
            &git::GitLogParser::new(options.log_delimiter.clone()),
            raw,
            options,
        ),
        ToolKind::GitStatus => render(&git::GitStatusParser, raw, options),
        ToolKind::GitDiff => render(&git::GitDiffParser, raw, options),
        ToolKind::CargoAudit => render(&audit::CargoAuditParser, raw, options),
        ToolKind::Coverage => render(&coverage::CoverageParser, raw, options),
        ToolKind::CargoTree => render(&tree::CargoTreeParser, raw, options),
        ToolKind::DockerPs => render(&docker::DockerPsParser, raw, options),
        ToolKind::DockerImages => render(&docker::DockerImagesParser, raw, options),
        ToolKind::GhChecks => render(&gh::GhChecksParser, raw, options),
    }
}

fn render<P>(parser: &P, raw: &RawOutput, options: &ParseOptions) -> Result<Rendered, ParseError>
where
    P: ToolParser,
    P::Output: Compact,
{
    let result = parser.parse(raw)?;
    let success = result.success();
    let summary = result.summary();
    let shaped = if options.prefer_full {
        crate::compact::Shaped::Full(result)
    } else {
        shape(result, raw)
    };
    let kind = shaped.kind();
    let value =
        serde_json::to_value(&shaped).map_err(|e| ParseError::Serialization(e.to_string()))?;
    debug!(tool = parser.tool(), shape = ?kind, success, "Rendered result");
    Ok(Rendered {
        shape: kind,
        value,
        summary,
        success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_limit_marks_truncation() {
        let raw = RawOutput::new("abcdef", "xy", 1).with_limit(4);
        assert_eq!(raw.stdout, "abcd");
        assert_eq!(raw.stderr, "xy");
        assert!(raw.truncated);
        assert!(raw.meta().truncated);
    }

    #[test]
    fn test_with_limit_respects_char_boundary() {
        let raw = RawOutput::new("aé", "", 0).with_limit(2);
        assert_eq!(raw.stdout, "a");
        assert!(raw.truncated);
    }

    #[test]
    fn test_with_limit_untouched_output() {
        let raw = RawOutput::new("abc", "", 0).with_limit(3);
        assert!(!raw.truncated);
    }

    #[test]
    fn test_meta_flags_are_independent() {
        let raw = RawOutput::new("", "", 124)
            .with_timed_out(true)
            .with_elapsed(30.0)
            .with_limit(0);
        let meta = raw.meta();
        assert!(meta.timed_out);
        assert!(!meta.truncated);
        assert_eq!(meta.exit_code, 124);
        assert_eq!(meta.duration, Some(30.0));
        assert!(!raw.success());
    }

    #[test]
    fn test_meta_omits_unknown_duration() {
        let meta = RawOutput::new("", "", 0).meta();
        assert_eq!(meta.duration, None);
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("duration").is_none());
        assert_eq!(json["timedOut"], false);
    }

    #[test]
    fn test_parse_any_tsc_example() {
        let raw = RawOutput::new(
            "src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.\n",
            "",
            2,
        );
        let rendered = parse_any(ToolKind::Tsc, &raw, &ParseOptions::default()).unwrap();
        assert!(!rendered.success);
        let data = &rendered.value["data"];
        assert_eq!(data["errors"], 1);
        assert!(rendered.summary.starts_with("tsc: build failed"));
    }

    #[test]
    fn test_parse_any_prefer_full() {
        let raw = RawOutput::new("", "", 0);
        let options = ParseOptions {
            prefer_full: true,
            ..Default::default()
        };
        let rendered = parse_any(ToolKind::GitStatus, &raw, &options).unwrap();
        assert_eq!(rendered.shape, ShapeKind::Full);
        assert_eq!(rendered.value["shape"], "full");
    }

    #[test]
    fn test_command_prefix_git_log_uses_delimiter() {
        let options = ParseOptions {
            log_delimiter: "@@".to_string(),
            prefer_full: false,
        };
        let (program, args) = ToolKind::GitLog.command_prefix(&options);
        assert_eq!(program, "git");
        assert_eq!(args[0], "log");
        assert!(args.iter().any(|a| a.contains("@@")));
    }
}
