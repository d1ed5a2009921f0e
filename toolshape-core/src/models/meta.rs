// toolshape-core/src/models/meta.rs

use serde::{Deserialize, Serialize};

/// Facts about the process run itself, shared by every Result.
///
/// Timed-out, truncated and a non-zero exit code are independent: a run can
/// report any combination of the three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    pub exit_code: i32,
    /// Wall-clock seconds; absent when the caller had no timing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub truncated: bool,
    pub timed_out: bool,
}

impl RunMeta {
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Duration for summaries, `0.0` when unknown.
    pub fn seconds(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }
}
