// toolshape-core/src/parsers/compiler.rs

//! Line-oriented compiler and linter diagnostics: tsc, gcc/clang and mypy.
//!
//! Each tool prints one diagnostic per line in one of two shapes:
//!
//! ```text
//! src/index.ts(10,5): error TS2322: Type 'string' is not assignable ...
//! src/main.c:3:9: warning: unused variable 'x' [-Wunused-variable]
//! ```
//!
//! Lines that match neither shape are skipped. Both streams are scanned,
//! stdout first.

use super::{RawOutput, ToolParser};
use crate::assemble::{dedup_exact, strip_code_prefix};
use crate::errors::ParseError;
use crate::models::diagnostic::{Diagnostic, DiagnosticsResult, Severity};
use crate::tokenize::{merged_lines, Source};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

lazy_static! {
    static ref PAREN_LOCATION: Regex = Regex::new(
        r"^(?P<file>\S.*?)\((?P<line>\d+),(?P<col>\d+)\): (?P<sev>[A-Za-z]+) (?P<code>[A-Za-z]*\d+): (?P<msg>.*)$"
    )
    .expect("valid tsc regex");
    static ref COLON_LOCATION: Regex = Regex::new(
        r"^(?P<file>\S.*?):(?P<line>\d+):(?P<col>\d+): (?P<sev>fatal error|[A-Za-z]+): (?P<msg>.*)$"
    )
    .expect("valid gcc regex");
    static ref COLON_LOCATION_NO_COLUMN: Regex = Regex::new(
        r"^(?P<file>\S.*?):(?P<line>\d+): (?P<sev>[A-Za-z]+): (?P<msg>.*)$"
    )
    .expect("valid mypy regex");
    static ref TRAILING_CODE: Regex =
        Regex::new(r"^(?P<msg>.*?)\s+\[(?P<code>[^\]\s]+)\]$").expect("valid code regex");
}

/// Matched fields of one diagnostic line, before tool-specific mapping.
struct RawDiagnostic<'a> {
    file: &'a str,
    line: u32,
    column: u32,
    severity: &'a str,
    code: Option<&'a str>,
    message: &'a str,
}

fn match_paren(line: &str) -> Option<RawDiagnostic<'_>> {
    let caps = PAREN_LOCATION.captures(line)?;
    Some(RawDiagnostic {
        file: caps.name("file")?.as_str(),
        line: caps.name("line")?.as_str().parse().ok()?,
        column: caps.name("col")?.as_str().parse().ok()?,
        severity: caps.name("sev")?.as_str(),
        code: caps.name("code").map(|m| m.as_str()),
        message: caps.name("msg")?.as_str(),
    })
}

fn match_colon(line: &str) -> Option<RawDiagnostic<'_>> {
    let caps = COLON_LOCATION.captures(line)?;
    Some(RawDiagnostic {
        file: caps.name("file")?.as_str(),
        line: caps.name("line")?.as_str().parse().ok()?,
        column: caps.name("col")?.as_str().parse().ok()?,
        severity: caps.name("sev")?.as_str(),
        code: None,
        message: caps.name("msg")?.as_str(),
    })
}

/// mypy without a column prints `file:line: severity: message`; the column
/// is then reported as 1.
fn match_colon_no_column(line: &str) -> Option<RawDiagnostic<'_>> {
    let caps = COLON_LOCATION_NO_COLUMN.captures(line)?;
    Some(RawDiagnostic {
        file: caps.name("file")?.as_str(),
        line: caps.name("line")?.as_str().parse().ok()?,
        column: 1,
        severity: caps.name("sev")?.as_str(),
        code: None,
        message: caps.name("msg")?.as_str(),
    })
}

/// Splits a trailing `[code]` off a message.
fn split_trailing_code(message: &str) -> (String, Option<String>) {
    match TRAILING_CODE.captures(message) {
        Some(caps) => (
            caps["msg"].to_string(),
            Some(caps["code"].to_string()),
        ),
        None => (message.to_string(), None),
    }
}

fn valid_position(raw: &RawDiagnostic<'_>) -> bool {
    raw.line >= 1 && raw.column >= 1
}

/// TypeScript compiler (`tsc --pretty false`).
///
/// Indented lines right after a diagnostic are the rest of its message
/// (elaboration chains) and are appended to it with a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TscParser;

fn tsc_severity(label: &str) -> Severity {
    match label.to_ascii_lowercase().as_str() {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "message" | "suggestion" => Severity::Note,
        _ => Severity::Warning,
    }
}

impl ToolParser for TscParser {
    type Output = DiagnosticsResult;

    fn tool(&self) -> &'static str {
        "tsc"
    }

    fn parse(&self, raw: &RawOutput) -> Result<DiagnosticsResult, ParseError> {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut last_source: Option<Source> = None;
        for (source, line) in merged_lines(&raw.stdout, &raw.stderr) {
            if let Some(m) = match_paren(line).filter(valid_position) {
                diagnostics.push(Diagnostic {
                    file: m.file.to_string(),
                    line: m.line,
                    column: m.column,
                    severity: tsc_severity(m.severity),
                    code: m.code.map(strip_code_prefix),
                    message: m.message.to_string(),
                    suggestion: None,
                });
                last_source = Some(source);
                continue;
            }
            let continues = line.starts_with("  ") && !line.trim().is_empty();
            match diagnostics.last_mut() {
                Some(prev) if continues && last_source == Some(source) => {
                    prev.message.push('\n');
                    prev.message.push_str(line.trim());
                }
                _ => {
                    last_source = None;
                    trace!(line = line, "Skipping non-diagnostic tsc line");
                }
            }
        }
        let diagnostics = dedup_exact(diagnostics);
        debug!(count = diagnostics.len(), "Parsed tsc diagnostics");
        Ok(DiagnosticsResult::new(self.tool(), raw.meta(), diagnostics))
    }
}

/// gcc and clang (`-fdiagnostics-color=never`).
///
/// A trailing `[-Wflag]` becomes the diagnostic code.
#[derive(Debug, Clone, Copy, Default)]
pub struct GccParser;

fn gcc_severity(label: &str) -> Severity {
    match label {
        "error" | "fatal error" => Severity::Error,
        "warning" => Severity::Warning,
        "note" | "remark" => Severity::Note,
        _ => Severity::Warning,
    }
}

impl ToolParser for GccParser {
    type Output = DiagnosticsResult;

    fn tool(&self) -> &'static str {
        "gcc"
    }

    fn parse(&self, raw: &RawOutput) -> Result<DiagnosticsResult, ParseError> {
        let diagnostics: Vec<Diagnostic> = merged_lines(&raw.stdout, &raw.stderr)
            .filter_map(|(_, line)| match_colon(line).filter(valid_position))
            .map(|m| {
                let (message, code) = split_trailing_code(m.message);
                Diagnostic {
                    file: m.file.to_string(),
                    line: m.line,
                    column: m.column,
                    severity: gcc_severity(m.severity),
                    code,
                    message,
                    suggestion: None,
                }
            })
            .collect();
        let diagnostics = dedup_exact(diagnostics);
        debug!(count = diagnostics.len(), "Parsed gcc diagnostics");
        Ok(DiagnosticsResult::new(self.tool(), raw.meta(), diagnostics))
    }
}

/// mypy (`--show-column-numbers`); a trailing `  [error-code]` becomes the
/// diagnostic code.
#[derive(Debug, Clone, Copy, Default)]
pub struct MypyParser;

fn mypy_severity(label: &str) -> Severity {
    match label {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "note" => Severity::Note,
        _ => Severity::Warning,
    }
}

impl ToolParser for MypyParser {
    type Output = DiagnosticsResult;

    fn tool(&self) -> &'static str {
        "mypy"
    }

    fn parse(&self, raw: &RawOutput) -> Result<DiagnosticsResult, ParseError> {
        let diagnostics: Vec<Diagnostic> = merged_lines(&raw.stdout, &raw.stderr)
            .filter_map(|(_, line)| {
                match_colon(line)
                    .or_else(|| match_colon_no_column(line))
                    .filter(valid_position)
            })
            .map(|m| {
                let (message, code) = split_trailing_code(m.message);
                Diagnostic {
                    file: m.file.to_string(),
                    line: m.line,
                    column: m.column,
                    severity: mypy_severity(m.severity),
                    code,
                    message,
                    suggestion: None,
                }
            })
            .collect();
        let diagnostics = dedup_exact(diagnostics);
        debug!(count = diagnostics.len(), "Parsed mypy diagnostics");
        Ok(DiagnosticsResult::new(self.tool(), raw.meta(), diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSC_OUTPUT: &str = "\
src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.
src/util.ts(3,1): warning TS6133: 'x' is declared but its value is never read.
src/app.ts(7,12): error TS2345: Argument of type '{ a: number; }' is not assignable to parameter of type 'Options'.
  Object literal may only specify known properties, and 'a' does not exist in type 'Options'.

Found 2 errors in 2 files.
";

    #[test]
    fn test_tsc_single_error_example() {
        let raw = RawOutput::new(
            "src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.",
            "",
            2,
        );
        let result = TscParser.parse(&raw).unwrap();
        assert!(!result.success);
        assert_eq!(result.errors, 1);
        assert_eq!(result.warnings, 0);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic {
                file: "src/index.ts".into(),
                line: 10,
                column: 5,
                severity: Severity::Error,
                code: Some("2322".into()),
                message: "Type 'string' is not assignable to type 'number'.".into(),
                suggestion: None,
            }]
        );
    }

    #[test]
    fn test_tsc_multiple_and_continuations() {
        let result = TscParser.parse(&RawOutput::new(TSC_OUTPUT, "", 2)).unwrap();
        assert_eq!(result.diagnostics.len(), 3);
        assert_eq!(result.errors, 2);
        assert_eq!(result.warnings, 1);
        assert_eq!(result.diagnostics[1].code.as_deref(), Some("6133"));
        assert!(result.diagnostics[2]
            .message
            .ends_with("\nObject literal may only specify known properties, and 'a' does not exist in type 'Options'."));
        result.verify_counts().unwrap();
    }

    #[test]
    fn test_tsc_unknown_severity_falls_back_to_warning() {
        let raw = RawOutput::new("a.ts(1,1): hint TS100: something", "", 0);
        let result = TscParser.parse(&raw).unwrap();
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
        assert_eq!(result.errors, 0);
        assert!(result.success);
    }

    #[test]
    fn test_tsc_scans_both_streams_and_dedups() {
        let line = "a.ts(1,1): error TS1: boom";
        let other = "b.ts(2,2): error TS2: bang";
        let raw = RawOutput::new(line, format!("{}\n{}", other, line), 1);
        let result = TscParser.parse(&raw).unwrap();
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.diagnostics[0].file, "a.ts");
        assert_eq!(result.diagnostics[1].file, "b.ts");
    }

    #[test]
    fn test_tsc_path_with_parentheses() {
        let raw = RawOutput::new(
            "app/(auth)/login/page.tsx(12,7): error TS2322: Type 'number' is not assignable to type 'string'.\n",
            "",
            2,
        );
        let result = TscParser.parse(&raw).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.diagnostics[0].file, "app/(auth)/login/page.tsx");
        assert_eq!(result.diagnostics[0].line, 12);
        assert_eq!(result.diagnostics[0].column, 7);
    }

    #[test]
    fn test_gcc_lines() {
        let stderr = "\
main.c: In function 'main':
main.c:3:9: warning: unused variable 'x' [-Wunused-variable]
    3 |     int x;
      |         ^
main.c:5:5: error: 'y' undeclared (first use in this function)
main.c:5:5: note: each undeclared identifier is reported only once for each function it appears in
lib.c:1:10: fatal error: missing.h: No such file or directory
compilation terminated.
";
        let result = GccParser.parse(&RawOutput::new("", stderr, 1)).unwrap();
        assert_eq!(result.diagnostics.len(), 4);
        assert_eq!(result.errors, 2);
        assert_eq!(result.warnings, 1);
        assert_eq!(result.notes, 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("-Wunused-variable"));
        assert_eq!(result.diagnostics[0].message, "unused variable 'x'");
        assert_eq!(result.diagnostics[3].message, "missing.h: No such file or directory");
        assert!(!result.success);
        result.verify_counts().unwrap();
    }

    #[test]
    fn test_gcc_drive_letter_path() {
        let stderr = "C:\\proj\\main.c:3:9: warning: unused variable 'x' [-Wunused-variable]\n";
        let result = GccParser.parse(&RawOutput::new("", stderr, 0)).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].file, "C:\\proj\\main.c");
        assert_eq!(result.diagnostics[0].line, 3);
        assert_eq!(result.diagnostics[0].column, 9);
        assert_eq!(result.warnings, 1);
    }

    #[test]
    fn test_mypy_drive_letter_path() {
        let stdout = "C:\\src\\app.py:4: note: Revealed type is \"builtins.str\"\n";
        let result = MypyParser.parse(&RawOutput::new(stdout, "", 0)).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].file, "C:\\src\\app.py");
        assert_eq!(result.diagnostics[0].line, 4);
    }

    #[test]
    fn test_mypy_lines() {
        let stdout = "\
app/models.py:12:5: error: Incompatible types in assignment (expression has type \"str\", variable has type \"int\")  [assignment]
app/models.py:20: note: Revealed type is \"builtins.int\"
app/views.py:3:1: error: Module \"app\" has no attribute \"missing\"  [attr-defined]
Found 2 errors in 2 files (checked 5 source files)
";
        let result = MypyParser.parse(&RawOutput::new(stdout, "", 1)).unwrap();
        assert_eq!(result.diagnostics.len(), 3);
        assert_eq!(result.errors, 2);
        assert_eq!(result.notes, 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("assignment"));
        assert_eq!(result.diagnostics[1].column, 1);
        assert_eq!(result.diagnostics[1].code, None);
    }

    #[test]
    fn test_clean_run_is_success() {
        let result = MypyParser
            .parse(&RawOutput::new("Success: no issues found in 3 source files\n", "", 0))
            .unwrap();
        assert!(result.success);
        assert!(result.diagnostics.is_empty());
    }
}
