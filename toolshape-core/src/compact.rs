// toolshape-core/src/compact.rs

//! Chooses between a full Result and its compact projection, and renders
//! the human-readable summary of either.
//!
//! The decision is a single function of the Result and the raw output it
//! came from. Summaries only ever read stored counts.

use crate::models::audit::AuditResult;
use crate::models::checks::{CheckState, ChecksResult};
use crate::models::diagnostic::{BuildResult, Diagnostic, DiagnosticsResult, Severity};
use crate::models::meta::RunMeta;
use crate::models::tables::{
    ContainerResult, CoverageRecord, CoverageResult, ImageResult, TreeResult,
};
use crate::models::testing::{TestOutcome, TestRunResult};
use crate::models::vcs::{DiffResult, LogResult, StatusResult};
use crate::parsers::RawOutput;
use serde::Serialize;
use tracing::debug;

/// A Result that can be projected down and summarized.
pub trait Compact: Serialize {
    type Projection: Serialize;

    fn success(&self) -> bool;

    /// Number of per-item entries the full record carries.
    fn item_count(&self) -> usize;

    /// Counts and headline fields only; the per-item lists are dropped.
    fn compact(&self) -> Self::Projection;

    fn summary(&self) -> String;
}

/// Which form the caller received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Full,
    Compact,
}

/// The full record or its projection, tagged so the caller can tell them
/// apart: `{"shape": "full" | "compact", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "lowercase")]
pub enum Shaped<R, P> {
    Full(R),
    Compact(P),
}

impl<R, P> Shaped<R, P> {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shaped::Full(_) => ShapeKind::Full,
            Shaped::Compact(_) => ShapeKind::Compact,
        }
    }
}

fn json_size<T: Serialize>(value: &T) -> Option<usize> {
    serde_json::to_vec(value).ok().map(|bytes| bytes.len())
}

/// Returns the compact projection only when the full record is bigger than
/// the raw output was and the projection is strictly smaller than the full
/// record. A record without items carries nothing the projection would
/// drop, so it always stays full; so do ties.
pub fn shape<R: Compact>(result: R, raw: &RawOutput) -> Shaped<R, R::Projection> {
    if result.item_count() == 0 {
        return Shaped::Full(result);
    }
    let full_size = json_size(&result).unwrap_or(0);
    if full_size <= raw.len() {
        debug!(full_size, raw_size = raw.len(), "Keeping full result");
        return Shaped::Full(result);
    }
    let projection = result.compact();
    let compact_size = json_size(&projection).unwrap_or(usize::MAX);
    if compact_size < full_size {
        debug!(full_size, compact_size, raw_size = raw.len(), "Using compact projection");
        Shaped::Compact(projection)
    } else {
        Shaped::Full(result)
    }
}

fn seconds(meta: &RunMeta) -> String {
    format!("{:.2}", meta.seconds())
}

fn diagnostic_line(d: &Diagnostic) -> String {
    let code = d
        .code
        .as_deref()
        .map(|c| format!("[{}]", c))
        .unwrap_or_default();
    format!(
        "{}{} {}:{}:{} {}",
        d.severity, code, d.file, d.line, d.column, d.message
    )
}

fn build_summary(tool: &str, success: bool, meta: &RunMeta, diagnostics: &[Diagnostic]) -> String {
    let verdict = if success { "succeeded" } else { "failed" };
    let mut out = format!("{}: build {} in {}s", tool, verdict, seconds(meta));
    for d in diagnostics
        .iter()
        .filter(|d| matches!(d.severity, Severity::Error | Severity::Warning))
    {
        out.push('\n');
        out.push_str(&diagnostic_line(d));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsCompact {
    pub tool: String,
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub errors: usize,
    pub warnings: usize,
    pub notes: usize,
}

impl Compact for DiagnosticsResult {
    type Projection = DiagnosticsCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.diagnostics.len()
    }

    fn compact(&self) -> DiagnosticsCompact {
        DiagnosticsCompact {
            tool: self.tool.clone(),
            meta: self.meta.clone(),
            success: self.success,
            errors: self.errors,
            warnings: self.warnings,
            notes: self.notes,
        }
    }

    fn summary(&self) -> String {
        build_summary(&self.tool, self.success, &self.meta, &self.diagnostics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildCompact {
    pub tool: String,
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub errors: usize,
    pub warnings: usize,
    pub artifacts: usize,
}

impl Compact for BuildResult {
    type Projection = BuildCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.diagnostics.len()
    }

    fn compact(&self) -> BuildCompact {
        BuildCompact {
            tool: self.tool.clone(),
            meta: self.meta.clone(),
            success: self.success,
            errors: self.errors,
            warnings: self.warnings,
            artifacts: self.artifacts,
        }
    }

    fn summary(&self) -> String {
        build_summary(&self.tool, self.success, &self.meta, &self.diagnostics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRunCompact {
    pub tool: String,
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cached: usize,
    /// `package/TestName` of every failing test.
    pub failures: Vec<String>,
}

impl Compact for TestRunResult {
    type Projection = TestRunCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.tests.len() + self.packages.len()
    }

    fn compact(&self) -> TestRunCompact {
        TestRunCompact {
            tool: self.tool.clone(),
            meta: self.meta.clone(),
            success: self.success,
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            cached: self.cached,
            failures: self
                .tests
                .iter()
                .filter(|t| t.outcome == TestOutcome::Fail)
                .map(|t| format!("{}/{}", t.package, t.name))
                .collect(),
        }
    }

    fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed, {} cached ({}s)",
            self.tool,
            self.passed,
            self.failed,
            self.cached,
            seconds(&self.meta)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

impl Compact for LogResult {
    type Projection = LogCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.commits.len()
    }

    fn compact(&self) -> LogCompact {
        LogCompact {
            meta: self.meta.clone(),
            success: self.success,
            total: self.total,
            latest: self.commits.first().map(|c| c.short_hash.clone()),
        }
    }

    fn summary(&self) -> String {
        format!("git log: {} commits", self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub upstream_gone: bool,
    pub ahead: u32,
    pub behind: u32,
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
    pub conflicted: usize,
    pub clean: bool,
}

impl Compact for StatusResult {
    type Projection = StatusCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.entries.len()
    }

    fn compact(&self) -> StatusCompact {
        StatusCompact {
            meta: self.meta.clone(),
            success: self.success,
            branch: self.branch.clone(),
            upstream: self.upstream.clone(),
            upstream_gone: self.upstream_gone,
            ahead: self.ahead,
            behind: self.behind,
            staged: self.staged,
            unstaged: self.unstaged,
            untracked: self.untracked,
            conflicted: self.conflicted,
            clean: self.clean,
        }
    }

    fn summary(&self) -> String {
        let branch = self.branch.as_deref().unwrap_or("(detached)");
        let tracking = match &self.upstream {
            Some(up) if self.upstream_gone => format!("{}...{} gone", branch, up),
            Some(up) => format!("{}...{} ahead {}, behind {}", branch, up, self.ahead, self.behind),
            None => branch.to_string(),
        };
        if self.clean {
            format!("git status: {} clean", tracking)
        } else {
            format!(
                "git status: {} {} staged, {} unstaged, {} untracked, {} conflicted",
                tracking, self.staged, self.unstaged, self.untracked, self.conflicted
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub files_changed: usize,
    pub insertions: u64,
    pub deletions: u64,
}

impl Compact for DiffResult {
    type Projection = DiffCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.files.len()
    }

    fn compact(&self) -> DiffCompact {
        DiffCompact {
            meta: self.meta.clone(),
            success: self.success,
            files_changed: self.files_changed,
            insertions: self.insertions,
            deletions: self.deletions,
        }
    }

    fn summary(&self) -> String {
        format!(
            "git diff: {} files changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
    pub unknown: usize,
    pub warnings: usize,
}

impl Compact for AuditResult {
    type Projection = AuditCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.vulnerabilities.len() + self.warnings.len()
    }

    fn compact(&self) -> AuditCompact {
        AuditCompact {
            meta: self.meta.clone(),
            success: self.success,
            total: self.total,
            critical: self.critical,
            high: self.high,
            medium: self.medium,
            low: self.low,
            informational: self.informational,
            unknown: self.unknown,
            warnings: self.warning_count,
        }
    }

    fn summary(&self) -> String {
        let mut out = format!(
            "cargo audit: {} vulnerabilities ({} critical, {} high, {} medium, {} low, {} informational, {} unknown), {} warnings",
            self.total,
            self.critical,
            self.high,
            self.medium,
            self.low,
            self.informational,
            self.unknown,
            self.warning_count
        );
        for v in &self.vulnerabilities {
            out.push_str(&format!(
                "\n{} {} {} {} {}",
                v.severity, v.id, v.package, v.version, v.title
            ));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CoverageRecord>,
}

impl Compact for CoverageResult {
    type Projection = CoverageCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.files.len()
    }

    fn compact(&self) -> CoverageCompact {
        CoverageCompact {
            meta: self.meta.clone(),
            success: self.success,
            total: self.total,
            summary: self.summary.clone(),
        }
    }

    fn summary(&self) -> String {
        let pct = |v: Option<f64>| v.map(|p| format!("{}%", p)).unwrap_or_else(|| "n/a".into());
        match &self.summary {
            Some(s) => format!(
                "coverage: lines {}, statements {}, branches {}, functions {} across {} files",
                pct(s.lines),
                pct(s.statements),
                pct(s.branches),
                pct(s.functions),
                self.total
            ),
            None => format!("coverage: no totals row across {} files", self.total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    pub max_depth: usize,
    /// Packages at depth 1.
    pub direct: usize,
}

impl Compact for TreeResult {
    type Projection = TreeCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.nodes.len()
    }

    fn compact(&self) -> TreeCompact {
        TreeCompact {
            meta: self.meta.clone(),
            success: self.success,
            total: self.total,
            max_depth: self.max_depth,
            direct: self.nodes.iter().filter(|n| n.depth == 1).count(),
        }
    }

    fn summary(&self) -> String {
        format!(
            "cargo tree: {} packages, max depth {}",
            self.total, self.max_depth
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub running: usize,
    pub stopped: usize,
}

impl Compact for ContainerResult {
    type Projection = ContainerCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.containers.len()
    }

    fn compact(&self) -> ContainerCompact {
        ContainerCompact {
            meta: self.meta.clone(),
            success: self.success,
            running: self.running,
            stopped: self.stopped,
        }
    }

    fn summary(&self) -> String {
        format!("docker ps: {} running, {} stopped", self.running, self.stopped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub total: usize,
    pub total_bytes: u64,
}

impl Compact for ImageResult {
    type Projection = ImageCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.images.len()
    }

    fn compact(&self) -> ImageCompact {
        ImageCompact {
            meta: self.meta.clone(),
            success: self.success,
            total: self.total,
            total_bytes: self.total_bytes,
        }
    }

    fn summary(&self) -> String {
        format!("docker images: {} images, {} bytes", self.total, self.total_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecksCompact {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub success: bool,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub cancelled: usize,
    /// Names of failing checks.
    pub failing: Vec<String>,
}

impl Compact for ChecksResult {
    type Projection = ChecksCompact;

    fn success(&self) -> bool {
        self.success
    }

    fn item_count(&self) -> usize {
        self.checks.len()
    }

    fn compact(&self) -> ChecksCompact {
        ChecksCompact {
            meta: self.meta.clone(),
            success: self.success,
            passed: self.passed,
            failed: self.failed,
            pending: self.pending,
            skipped: self.skipped,
            cancelled: self.cancelled,
            failing: self
                .checks
                .iter()
                .filter(|c| c.state == CheckState::Fail)
                .map(|c| c.name.clone())
                .collect(),
        }
    }

    fn summary(&self) -> String {
        format!(
            "gh pr checks: {} passed, {} failed, {} pending, {} skipped, {} cancelled",
            self.passed, self.failed, self.pending, self.skipped, self.cancelled
        )
    }
}
