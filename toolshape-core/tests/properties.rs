// toolshape-core/tests/properties.rs

use toolshape_core::compact::{shape, Compact, ShapeKind};
use toolshape_core::models::diagnostic::{Diagnostic, Severity};
use toolshape_core::parsers::audit::CargoAuditParser;
use toolshape_core::parsers::cargo::CargoBuildParser;
use toolshape_core::parsers::compiler::{GccParser, MypyParser, TscParser};
use toolshape_core::parsers::coverage::CoverageParser;
use toolshape_core::parsers::docker::{DockerImagesParser, DockerPsParser};
use toolshape_core::parsers::gh::GhChecksParser;
use toolshape_core::parsers::git::{GitDiffParser, GitLogParser, GitStatusParser};
use toolshape_core::parsers::gotest::GoTestParser;
use toolshape_core::parsers::tree::CargoTreeParser;
use toolshape_core::{
    guard, guard_all, parse_any, score_vector, severity_for, ParseError, ParseOptions, RawOutput,
    ToolKind, ToolParser, VulnSeverity,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

const TSC: &str = "\
src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.
src/index.ts(14,1): warning TS6133: 'unused' is declared but its value is never read.
src/app.ts(3,22): error TS2345: Argument of type 'number' is not assignable to parameter of type 'string'.
src/app.ts(9,7): message TS6385: 'legacy' is deprecated.

Found 2 errors in 2 files.
";

const GCC: &str = "\
main.c: In function 'main':
main.c:3:9: warning: unused variable 'x' [-Wunused-variable]
    3 |     int x;
      |         ^
main.c:5:5: error: 'y' undeclared (first use in this function)
main.c:5:5: note: each undeclared identifier is reported only once
";

const MYPY: &str = "\
app/models.py:12:5: error: Incompatible types in assignment  [assignment]
app/models.py:20:1: note: Revealed type is \"builtins.int\"
app/views.py:4:1: warning: Unused \"type: ignore\" comment  [unused-ignore]
Found 1 error in 1 file (checked 5 source files)
";

fn check_diagnostic_counts(diagnostics: &[Diagnostic], errors: usize, warnings: usize) {
    let count = |s| diagnostics.iter().filter(|d| d.severity == s).count();
    assert_eq!(errors, count(Severity::Error));
    assert_eq!(warnings, count(Severity::Warning));
}

#[test]
fn diagnostic_counts_match_lists_for_every_fixture() {
    init_logging();
    let tsc = TscParser.parse(&RawOutput::new(TSC, "", 2)).unwrap();
    check_diagnostic_counts(&tsc.diagnostics, tsc.errors, tsc.warnings);
    tsc.verify_counts().unwrap();

    let gcc = GccParser.parse(&RawOutput::new("", GCC, 1)).unwrap();
    check_diagnostic_counts(&gcc.diagnostics, gcc.errors, gcc.warnings);
    gcc.verify_counts().unwrap();

    let mypy = MypyParser.parse(&RawOutput::new(MYPY, "", 1)).unwrap();
    check_diagnostic_counts(&mypy.diagnostics, mypy.errors, mypy.warnings);
    mypy.verify_counts().unwrap();

    let cargo_stream = r#"{"reason":"compiler-message","message":{"code":{"code":"E0425"},"level":"error","message":"cannot find value `z`","spans":[{"file_name":"src/main.rs","line_start":7,"column_start":13,"is_primary":true}],"children":[]}}
{"reason":"compiler-message","message":{"code":null,"level":"warning","message":"1 warning emitted","spans":[],"children":[]}}
{"reason":"build-finished","success":false}"#;
    let cargo = CargoBuildParser
        .parse(&RawOutput::new(cargo_stream, "", 101))
        .unwrap();
    check_diagnostic_counts(&cargo.diagnostics, cargo.errors, cargo.warnings);
    assert_eq!(cargo.diagnostics[0].code.as_deref(), Some("E0425"));
    cargo.verify_counts().unwrap();
}

#[test]
fn every_raw_diagnostic_appears_exactly_once() {
    let result = TscParser.parse(&RawOutput::new(TSC, "", 2)).unwrap();
    let located: Vec<&str> = TSC.lines().filter(|l| l.contains("): ")).collect();
    assert_eq!(result.diagnostics.len(), located.len());
    for (d, line) in result.diagnostics.iter().zip(&located) {
        let location = format!("{}({},{}): ", d.file, d.line, d.column);
        assert!(line.starts_with(&location), "{} vs {}", location, line);
        assert!(line.ends_with(&d.message));
    }

    // The same lines repeated on stderr add nothing.
    let doubled = TscParser.parse(&RawOutput::new(TSC, TSC, 2)).unwrap();
    assert_eq!(doubled.diagnostics, result.diagnostics);
}

#[test]
fn tsc_example_scenario() {
    let raw = RawOutput::new(
        "src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.",
        "",
        2,
    );
    let result = TscParser.parse(&raw).unwrap();
    assert!(!result.success);
    assert_eq!((result.errors, result.warnings), (1, 0));
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic {
            file: "src/index.ts".to_string(),
            line: 10,
            column: 5,
            severity: Severity::Error,
            code: Some("2322".to_string()),
            message: "Type 'string' is not assignable to type 'number'.".to_string(),
            suggestion: None,
        }]
    );
}

#[test]
fn log_messages_survive_delimiter_collisions() {
    let delimiter = "<|>";
    let messages = [
        "plain subject",
        "uses <|> once",
        "<|><|> many <|> times <|>",
    ];
    for message in messages {
        let line = ["abc123", "abc", "Dev <dev@example.com>", "2024-01-01", "", message]
            .join(delimiter);
        let result = GitLogParser::new(delimiter.to_string())
            .parse(&RawOutput::new(line, "", 0))
            .unwrap();
        assert_eq!(result.commits.len(), 1);
        assert_eq!(result.commits[0].message, message);
    }
}

#[test]
fn cvss_scores_stay_in_range_and_classify_on_closed_boundaries() {
    let vectors = [
        "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
        "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:H/A:H",
        "CVSS:3.0/AV:L/AC:H/PR:H/UI:R/S:U/C:L/I:N/A:N",
        "CVSS:3.1/AV:P/AC:H/PR:H/UI:R/S:U/C:N/I:N/A:N",
        "AV:N/AC:L/Au:N/C:P/I:P/A:P",
        "(AV:L/AC:H/Au:M/C:N/I:N/A:N)",
    ];
    for vector in vectors {
        let score = score_vector(vector).unwrap();
        assert!((0.0..=10.0).contains(&score), "{} -> {}", vector, score);
    }

    let critical = severity_for("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H");
    assert_eq!(critical.score, Some(9.8));
    assert_eq!(critical.severity, VulnSeverity::Critical);

    assert_eq!(severity_for("9.0").severity, VulnSeverity::Critical);
    assert_eq!(severity_for("8.9").severity, VulnSeverity::High);
    assert_eq!(severity_for("7.0").severity, VulnSeverity::High);
    assert_eq!(severity_for("4.0").severity, VulnSeverity::Medium);
    assert_eq!(severity_for("0.1").severity, VulnSeverity::Low);
    assert_eq!(severity_for("0.0").severity, VulnSeverity::Informational);

    let partial = severity_for("AV:N/AC:L");
    assert_eq!(partial.severity, VulnSeverity::Unknown);
    assert!(partial.score.is_none());
    assert!(score_vector("CVSS:3.1/AV:N/AC:L").is_none());
}

#[test]
fn compaction_never_loses_to_an_equal_or_smaller_full_form() {
    init_logging();
    // Zero items: full, whatever the raw size.
    let empty = TscParser.parse(&RawOutput::new("", "", 0)).unwrap();
    assert_eq!(shape(empty, &RawOutput::new("", "", 0)).kind(), ShapeKind::Full);

    // Raw text bigger than the full record: full.
    let line = "src/a.ts(1,1): error TS1005: ';' expected.\n";
    let noisy = RawOutput::new(line, "x".repeat(10_000), 2);
    let result = TscParser.parse(&noisy).unwrap();
    assert_eq!(shape(result, &noisy).kind(), ShapeKind::Full);

    // Many items whose JSON outgrows the raw text: compact.
    let many: String = (1..=50)
        .map(|i| format!("src/a.ts({},1): error TS1005: ';' expected.\n", i))
        .collect();
    let raw = RawOutput::new(many, "", 2);
    let result = TscParser.parse(&raw).unwrap();
    let full_size = serde_json::to_vec(&result).unwrap().len();
    let compact_size = serde_json::to_vec(&result.compact()).unwrap().len();
    assert!(full_size > raw.len());
    assert!(compact_size < full_size);
    assert_eq!(shape(result, &raw).kind(), ShapeKind::Compact);
}

#[test]
fn shaped_values_are_tagged() {
    let raw = RawOutput::new("## main\n", "", 0);
    let rendered = parse_any(ToolKind::GitStatus, &raw, &ParseOptions::default()).unwrap();
    assert_eq!(rendered.value["shape"], "full");
    assert_eq!(rendered.value["data"]["branch"], "main");
    assert_eq!(rendered.value["data"]["clean"], true);
    assert_eq!(rendered.value["data"]["exitCode"], 0);
}

#[test]
fn guard_example_scenario() {
    let err = guard("--exec=evil", "title").unwrap_err();
    assert!(matches!(err, ParseError::InvalidInput { .. }));
    let message = err.to_string();
    assert!(message.contains("title"));
    assert!(message.contains("--exec=evil"));

    assert!(guard("  -n", "count").is_err());
    assert!(guard("feature/login", "branch").is_ok());
    assert!(guard_all(&["src/", "--force"], "paths").is_err());
    assert!(guard_all::<&str>(&[], "paths").is_ok());
}

#[test]
fn every_tool_verifies_its_counts_on_empty_input() {
    let raw = RawOutput::new("", "", 0);
    TscParser.parse(&raw).unwrap().verify_counts().unwrap();
    CargoBuildParser.parse(&raw).unwrap().verify_counts().unwrap();
    GoTestParser.parse(&raw).unwrap().verify_counts().unwrap();
    GitLogParser::default().parse(&raw).unwrap().verify_counts().unwrap();
    GitStatusParser.parse(&raw).unwrap().verify_counts().unwrap();
    GitDiffParser.parse(&raw).unwrap().verify_counts().unwrap();
    CoverageParser.parse(&raw).unwrap().verify_counts().unwrap();
    CargoTreeParser.parse(&raw).unwrap().verify_counts().unwrap();
    DockerPsParser.parse(&raw).unwrap().verify_counts().unwrap();
    DockerImagesParser.parse(&raw).unwrap().verify_counts().unwrap();
    GhChecksParser.parse(&raw).unwrap().verify_counts().unwrap();

    let audit = CargoAuditParser.parse(&raw).unwrap();
    audit.verify_counts().unwrap();
    assert!(!audit.success);
}

#[test]
fn parse_any_covers_every_tool_kind() {
    use clap::ValueEnum;
    let raw = RawOutput::new("", "", 0);
    for kind in ToolKind::value_variants() {
        let rendered = parse_any(*kind, &raw, &ParseOptions::default()).unwrap();
        assert_eq!(rendered.shape, ShapeKind::Full, "{:?}", kind);
        assert!(!rendered.summary.is_empty());
    }
}
