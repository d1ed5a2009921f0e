// toolshape-core/src/models/checks.rs

use super::meta::RunMeta;
use crate::errors::{check_count, CountMismatch};
use serde::{Deserialize, Serialize};

/// Bucket a CI check falls into, as printed by `gh pr checks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Pass,
    Fail,
    Pending,
    Skipping,
    Cancel,
}

impl CheckState {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "pass" => Some(CheckState::Pass),
            "fail" => Some(CheckState::Fail),
            "pending" => Some(CheckState::Pending),
            "skipping" => Some(CheckState::Skipping),
            "cancel" => Some(CheckState::Cancel),
            _ => None,
        }
    }

    /// Higher wins when a check name appears more than once.
    pub fn precedence(&self) -> u8 {
        match self {
            CheckState::Fail => 4,
            CheckState::Cancel => 3,
            CheckState::Pending => 2,
            CheckState::Pass => 1,
            CheckState::Skipping => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub state: CheckState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecksResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub checks: Vec<CheckRecord>,
}

impl ChecksResult {
    /// Success comes from the check states alone: `gh` exits non-zero for
    /// pending checks, which says nothing about failures.
    pub fn new(meta: RunMeta, checks: Vec<CheckRecord>) -> Self {
        let by = |s| count_state(&checks, s);
        let (passed, failed, pending, skipped, cancelled) = (
            by(CheckState::Pass),
            by(CheckState::Fail),
            by(CheckState::Pending),
            by(CheckState::Skipping),
            by(CheckState::Cancel),
        );
        let success = if checks.is_empty() {
            meta.exited_cleanly()
        } else {
            failed == 0 && cancelled == 0 && pending == 0 && !meta.timed_out
        };
        Self {
            meta,
            success,
            passed,
            failed,
            pending,
            skipped,
            cancelled,
            checks,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        let c = &self.checks;
        check_count("passed", self.passed, count_state(c, CheckState::Pass))?;
        check_count("failed", self.failed, count_state(c, CheckState::Fail))?;
        check_count("pending", self.pending, count_state(c, CheckState::Pending))?;
        check_count("skipped", self.skipped, count_state(c, CheckState::Skipping))?;
        check_count("cancelled", self.cancelled, count_state(c, CheckState::Cancel))
    }
}

fn count_state(checks: &[CheckRecord], state: CheckState) -> usize {
    checks.iter().filter(|c| c.state == state).count()
}
