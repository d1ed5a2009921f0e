// toolshape-core/src/models/testing.rs

use super::meta::RunMeta;
use crate::errors::{check_count, CountMismatch};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Pass,
    Fail,
    Skip,
}

impl TestOutcome {
    /// Higher wins when the same test is reported more than once.
    pub fn precedence(&self) -> u8 {
        match self {
            TestOutcome::Fail => 2,
            TestOutcome::Pass => 1,
            TestOutcome::Skip => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub package: String,
    pub name: String,
    pub outcome: TestOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    /// Captured output, kept for failing tests only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub package: String,
    pub outcome: TestOutcome,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRunResult {
    pub tool: String,
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Packages whose results were replayed from the build cache.
    pub cached: usize,
    pub tests: Vec<TestRecord>,
    pub packages: Vec<PackageRecord>,
}

impl TestRunResult {
    pub fn new(
        tool: &str,
        meta: RunMeta,
        tests: Vec<TestRecord>,
        packages: Vec<PackageRecord>,
    ) -> Self {
        let passed = count_outcome(&tests, TestOutcome::Pass);
        let failed = count_outcome(&tests, TestOutcome::Fail);
        let skipped = count_outcome(&tests, TestOutcome::Skip);
        let cached = packages.iter().filter(|p| p.cached).count();
        let success = if tests.is_empty() && packages.is_empty() {
            meta.exited_cleanly()
        } else {
            failed == 0
                && packages.iter().all(|p| p.outcome != TestOutcome::Fail)
                && !meta.timed_out
        };
        Self {
            tool: tool.to_string(),
            meta,
            success,
            passed,
            failed,
            skipped,
            cached,
            tests,
            packages,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count("passed", self.passed, count_outcome(&self.tests, TestOutcome::Pass))?;
        check_count("failed", self.failed, count_outcome(&self.tests, TestOutcome::Fail))?;
        check_count("skipped", self.skipped, count_outcome(&self.tests, TestOutcome::Skip))?;
        check_count(
            "cached",
            self.cached,
            self.packages.iter().filter(|p| p.cached).count(),
        )
    }
}

fn count_outcome(tests: &[TestRecord], outcome: TestOutcome) -> usize {
    tests.iter().filter(|t| t.outcome == outcome).count()
}
