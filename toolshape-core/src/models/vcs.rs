// toolshape-core/src/models/vcs.rs

use super::meta::RunMeta;
use crate::errors::{check_count, CountMismatch};
use serde::{Deserialize, Serialize};

/// One commit from `git log` with the record format this crate requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub date: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    pub commits: Vec<CommitRecord>,
}

impl LogResult {
    pub fn new(meta: RunMeta, commits: Vec<CommitRecord>) -> Self {
        Self {
            success: meta.exited_cleanly(),
            total: commits.len(),
            meta,
            commits,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count("total", self.total, self.commits.len())
    }
}

/// Where a path's change lives in the index/worktree pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Staged,
    Unstaged,
    /// Changed in the index and again in the worktree.
    Both,
    Untracked,
    Ignored,
    Conflicted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_path: Option<String>,
    pub index: char,
    pub worktree: char,
    pub kind: ChangeKind,
}

impl StatusEntry {
    pub fn is_staged(&self) -> bool {
        matches!(self.kind, ChangeKind::Staged | ChangeKind::Both)
    }

    pub fn is_unstaged(&self) -> bool {
        matches!(self.kind, ChangeKind::Unstaged | ChangeKind::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    /// Upstream is configured but the remote branch no longer exists.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub upstream_gone: bool,
    pub ahead: u32,
    pub behind: u32,
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
    pub conflicted: usize,
    pub clean: bool,
    pub entries: Vec<StatusEntry>,
}

/// Branch line fields of `git status --branch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchInfo {
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub upstream_gone: bool,
    pub ahead: u32,
    pub behind: u32,
}

impl StatusResult {
    pub fn new(meta: RunMeta, branch: BranchInfo, entries: Vec<StatusEntry>) -> Self {
        let staged = entries.iter().filter(|e| e.is_staged()).count();
        let unstaged = entries.iter().filter(|e| e.is_unstaged()).count();
        let untracked = count_kind(&entries, ChangeKind::Untracked);
        let conflicted = count_kind(&entries, ChangeKind::Conflicted);
        let clean = entries.iter().all(|e| e.kind == ChangeKind::Ignored);
        Self {
            success: meta.exited_cleanly(),
            meta,
            branch: branch.branch,
            upstream: branch.upstream,
            upstream_gone: branch.upstream_gone,
            ahead: branch.ahead,
            behind: branch.behind,
            staged,
            unstaged,
            untracked,
            conflicted,
            clean,
            entries,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        check_count(
            "staged",
            self.staged,
            self.entries.iter().filter(|e| e.is_staged()).count(),
        )?;
        check_count(
            "unstaged",
            self.unstaged,
            self.entries.iter().filter(|e| e.is_unstaged()).count(),
        )?;
        check_count(
            "untracked",
            self.untracked,
            count_kind(&self.entries, ChangeKind::Untracked),
        )?;
        check_count(
            "conflicted",
            self.conflicted,
            count_kind(&self.entries, ChangeKind::Conflicted),
        )
    }
}

fn count_kind(entries: &[StatusEntry], kind: ChangeKind) -> usize {
    entries.iter().filter(|e| e.kind == kind).count()
}

/// One path from `git diff --numstat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffFileRecord {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    /// Absent for binary files, which git reports as `-`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletions: Option<u64>,
    pub binary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub files_changed: usize,
    pub insertions: u64,
    pub deletions: u64,
    pub files: Vec<DiffFileRecord>,
}

impl DiffResult {
    pub fn new(meta: RunMeta, files: Vec<DiffFileRecord>) -> Self {
        let (insertions, deletions) = line_totals(&files);
        Self {
            success: meta.exited_cleanly(),
            meta,
            files_changed: files.len(),
            insertions,
            deletions,
            files,
        }
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        let (insertions, deletions) = line_totals(&self.files);
        check_count("filesChanged", self.files_changed, self.files.len())?;
        check_count("insertions", self.insertions as usize, insertions as usize)?;
        check_count("deletions", self.deletions as usize, deletions as usize)
    }
}

fn line_totals(files: &[DiffFileRecord]) -> (u64, u64) {
    files.iter().fold((0, 0), |(ins, del), f| {
        (
            ins + f.additions.unwrap_or(0),
            del + f.deletions.unwrap_or(0),
        )
    })
}
