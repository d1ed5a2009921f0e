// toolshape-core/src/parsers/gotest.rs

//! `go test -json` event stream.

use super::{RawOutput, ToolParser};
use crate::assemble::dedup_by_precedence;
use crate::errors::ParseError;
use crate::models::testing::{PackageRecord, TestOutcome, TestRecord, TestRunResult};
use crate::tokenize::json_lines;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// One `test2json` event. Fields beyond these (`Time`, `ImportPath`...)
/// are ignored.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct TestEvent {
    action: String,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    test: Option<String>,
    #[serde(default)]
    elapsed: Option<f64>,
    #[serde(default)]
    output: Option<String>,
}

fn terminal_outcome(action: &str) -> Option<TestOutcome> {
    match action {
        "pass" => Some(TestOutcome::Pass),
        "fail" => Some(TestOutcome::Fail),
        "skip" => Some(TestOutcome::Skip),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GoTestParser;

impl ToolParser for GoTestParser {
    type Output = TestRunResult;

    fn tool(&self) -> &'static str {
        "go test"
    }

    fn parse(&self, raw: &RawOutput) -> Result<TestRunResult, ParseError> {
        let mut test_output: HashMap<(String, String), String> = HashMap::new();
        let mut package_output: HashMap<String, String> = HashMap::new();
        let mut tests = Vec::new();
        let mut packages = Vec::new();

        for event in json_lines::<TestEvent>(&raw.stdout) {
            let package = event.package.unwrap_or_default();
            if event.action == "output" {
                let text = event.output.unwrap_or_default();
                match event.test {
                    Some(test) => test_output
                        .entry((package, test))
                        .or_default()
                        .push_str(&text),
                    None => package_output.entry(package).or_default().push_str(&text),
                }
                continue;
            }
            let Some(outcome) = terminal_outcome(&event.action) else {
                continue;
            };
            match event.test {
                Some(name) => {
                    let captured = test_output.remove(&(package.clone(), name.clone()));
                    let output = if outcome == TestOutcome::Fail {
                        captured.filter(|o| !o.is_empty())
                    } else {
                        None
                    };
                    tests.push(TestRecord {
                        package,
                        name,
                        outcome,
                        elapsed: event.elapsed,
                        output,
                    });
                }
                None => {
                    let cached = package_output
                        .remove(&package)
                        .map(|o| o.contains("(cached)"))
                        .unwrap_or(false);
                    packages.push(PackageRecord {
                        package,
                        outcome,
                        cached,
                        elapsed: event.elapsed,
                    });
                }
            }
        }

        let tests = dedup_by_precedence(
            tests,
            |t| (t.package.clone(), t.name.clone()),
            |t| t.outcome.precedence(),
        );
        debug!(
            tests = tests.len(),
            packages = packages.len(),
            "Parsed go test event stream"
        );
        Ok(TestRunResult::new(self.tool(), raw.meta(), tests, packages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = r#"{"Time":"2024-05-01T10:00:00Z","Action":"start","Package":"example.com/app/api"}
{"Time":"2024-05-01T10:00:00Z","Action":"run","Package":"example.com/app/api","Test":"TestLogin"}
{"Time":"2024-05-01T10:00:00Z","Action":"output","Package":"example.com/app/api","Test":"TestLogin","Output":"=== RUN   TestLogin\n"}
{"Time":"2024-05-01T10:00:00Z","Action":"output","Package":"example.com/app/api","Test":"TestLogin","Output":"    login_test.go:14: expected 200, got 500\n"}
{"Time":"2024-05-01T10:00:00Z","Action":"fail","Package":"example.com/app/api","Test":"TestLogin","Elapsed":0.01}
{"Time":"2024-05-01T10:00:00Z","Action":"run","Package":"example.com/app/api","Test":"TestLogout"}
{"Time":"2024-05-01T10:00:00Z","Action":"output","Package":"example.com/app/api","Test":"TestLogout","Output":"--- PASS: TestLogout (0.00s)\n"}
{"Time":"2024-05-01T10:00:00Z","Action":"pass","Package":"example.com/app/api","Test":"TestLogout","Elapsed":0}
{"Time":"2024-05-01T10:00:00Z","Action":"skip","Package":"example.com/app/api","Test":"TestSlow","Elapsed":0}
{"Time":"2024-05-01T10:00:00Z","Action":"output","Package":"example.com/app/api","Output":"FAIL\n"}
{"Time":"2024-05-01T10:00:00Z","Action":"fail","Package":"example.com/app/api","Elapsed":0.02}
{"Time":"2024-05-01T10:00:00Z","Action":"output","Package":"example.com/app/store","Output":"ok  \texample.com/app/store\t(cached)\n"}
{"Time":"2024-05-01T10:00:00Z","Action":"pass","Package":"example.com/app/store","Elapsed":0}
"#;

    #[test]
    fn test_event_stream() {
        let result = GoTestParser.parse(&RawOutput::new(STREAM, "", 1)).unwrap();
        assert_eq!(result.tool, "go test");
        assert_eq!((result.passed, result.failed, result.skipped), (1, 1, 1));
        assert_eq!(result.cached, 1);
        assert!(!result.success);
        result.verify_counts().unwrap();

        let failing = &result.tests[0];
        assert_eq!(failing.name, "TestLogin");
        assert!(failing
            .output
            .as_deref()
            .unwrap()
            .contains("expected 200, got 500"));
        assert!(result.tests[1].output.is_none());

        let store = &result.packages[1];
        assert_eq!(store.package, "example.com/app/store");
        assert!(store.cached);
        assert!(!result.packages[0].cached);
    }

    #[test]
    fn test_rerun_keeps_failure() {
        let stream = r#"{"Action":"fail","Package":"p","Test":"TestFlaky","Elapsed":0.1}
{"Action":"pass","Package":"p","Test":"TestFlaky","Elapsed":0.1}
{"Action":"pass","Package":"p","Test":"TestStable","Elapsed":0.1}
{"Action":"pass","Package":"p","Test":"TestStable","Elapsed":0.2}
"#;
        let result = GoTestParser.parse(&RawOutput::new(stream, "", 1)).unwrap();
        assert_eq!(result.tests.len(), 2);
        assert_eq!(result.tests[0].outcome, TestOutcome::Fail);
        assert_eq!(result.tests[1].elapsed, Some(0.1));
        assert_eq!((result.passed, result.failed), (1, 1));
    }

    #[test]
    fn test_no_events_falls_back_to_exit_code() {
        let raw = RawOutput::new("", "# example.com/app\n./main.go:3:1: syntax error\n", 2);
        let result = GoTestParser.parse(&raw).unwrap();
        assert!(result.tests.is_empty());
        assert!(!result.success);

        let clean = GoTestParser.parse(&RawOutput::new("", "", 0)).unwrap();
        assert!(clean.success);
    }
}
