// toolshape-core/src/models/tables.rs

//! Records read from column tables and indented listings.

use super::meta::RunMeta;
use crate::errors::{check_count, CountMismatch};
use serde::{Deserialize, Serialize};

/// One row of an istanbul/nyc text coverage table.
///
/// Percentages are parsed straight from the cell text; a cell that isn't a
/// number (blank, `Unknown`) is absent rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecord {
    pub file: String,
    /// Nesting level from the row's indentation; `0` for the totals row.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncovered_lines: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CoverageRecord>,
    pub files: Vec<CoverageRecord>,
}

impl CoverageResult {
    pub fn new(meta: RunMeta, summary: Option<CoverageRecord>, files: Vec<CoverageRecord>) -> Self {
        Self {
            success: meta.exited_cleanly(),
            total: files.len(),
            meta,
            summary,
            files,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count("total", self.total, self.files.len())
    }
}

/// One package line of a `cargo tree` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub version: String,
    pub depth: usize,
    /// Path or registry in parentheses after the version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// `(*)`: the subtree was already printed above.
    pub repeated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    pub max_depth: usize,
    pub nodes: Vec<TreeNode>,
}

impl TreeResult {
    pub fn new(meta: RunMeta, nodes: Vec<TreeNode>) -> Self {
        Self {
            success: meta.exited_cleanly(),
            total: nodes.len(),
            max_depth: nodes.iter().map(|n| n.depth).max().unwrap_or(0),
            meta,
            nodes,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count("total", self.total, self.nodes.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Exited,
    Paused,
    Restarting,
    Created,
    Dead,
    Unknown,
}

/// One row of `docker ps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub id: String,
    pub image: String,
    pub command: String,
    pub created: String,
    pub status: String,
    pub state: ContainerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub running: usize,
    pub stopped: usize,
    pub containers: Vec<ContainerRecord>,
}

impl ContainerResult {
    pub fn new(meta: RunMeta, containers: Vec<ContainerRecord>) -> Self {
        let running = count_running(&containers);
        Self {
            success: meta.exited_cleanly(),
            stopped: containers.len() - running,
            running,
            meta,
            containers,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        let running = count_running(&self.containers);
        check_count("running", self.running, running)?;
        check_count("stopped", self.stopped, self.containers.len() - running)
    }
}

fn count_running(containers: &[ContainerRecord]) -> usize {
    containers
        .iter()
        .filter(|c| c.state == ContainerState::Running)
        .count()
}

/// One row of `docker images`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// `None` for dangling images printed as `<none>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub id: String,
    pub created: String,
    /// `None` when the SIZE cell could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    pub total_bytes: u64,
    pub images: Vec<ImageRecord>,
}

impl ImageResult {
    pub fn new(meta: RunMeta, images: Vec<ImageRecord>) -> Self {
        Self {
            success: meta.exited_cleanly(),
            total: images.len(),
            total_bytes: images.iter().filter_map(|i| i.size_bytes).sum(),
            meta,
            images,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count("total", self.total, self.images.len())
    }
}
