// toolshape-core/src/models/audit.rs

use super::meta::RunMeta;
use crate::errors::{check_count, CountMismatch};
use crate::scoring::VulnSeverity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRecord {
    pub id: String,
    pub package: String,
    pub version: String,
    pub severity: VulnSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<f64>,
    pub title: String,
    pub patched: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unaffected: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Non-vulnerability findings (unmaintained, yanked, unsound crates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditWarning {
    pub kind: String,
    pub package: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditResult {
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
    pub warning_count: usize,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub warnings: Vec<AuditWarning>,
}

impl AuditResult {
    /// `found` is the scanner's own verdict; the exit code only decides
    /// when the report doesn't say.
    pub fn new(
        meta: RunMeta,
        vulnerabilities: Vec<VulnerabilityRecord>,
        warnings: Vec<AuditWarning>,
        found: Option<bool>,
    ) -> Self {
        let success = match found {
            Some(found) => !found && vulnerabilities.is_empty() && !meta.timed_out,
            None => meta.exited_cleanly() && vulnerabilities.is_empty(),
        };
        let by = |s| count_severity(&vulnerabilities, s);
        Self {
            total: vulnerabilities.len(),
            critical: by(VulnSeverity::Critical),
            high: by(VulnSeverity::High),
            medium: by(VulnSeverity::Medium),
            low: by(VulnSeverity::Low),
            informational: by(VulnSeverity::Informational),
            unknown: by(VulnSeverity::Unknown),
            warning_count: warnings.len(),
            success,
            meta,
            vulnerabilities,
            warnings,
        }
    }

    /// The result for a report that could not be read at all.
    pub fn degraded(meta: RunMeta) -> Self {
        let mut result = Self::new(meta, Vec::new(), Vec::new(), None);
        result.success = false;
        result
    }

    pub fn verify_counts(&self) -> Result<(), CountMismatch> {
        let v = &self.vulnerabilities;
        check_count("total", self.total, v.len())?;
        check_count("critical", self.critical, count_severity(v, VulnSeverity::Critical))?;
        check_count("high", self.high, count_severity(v, VulnSeverity::High))?;
        check_count("medium", self.medium, count_severity(v, VulnSeverity::Medium))?;
        check_count("low", self.low, count_severity(v, VulnSeverity::Low))?;
        check_count(
            "informational",
            self.informational,
            count_severity(v, VulnSeverity::Informational),
        )?;
        check_count("unknown", self.unknown, count_severity(v, VulnSeverity::Unknown))?;
        check_count("warning_count", self.warning_count, self.warnings.len())
    }
}

fn count_severity(records: &[VulnerabilityRecord], severity: VulnSeverity) -> usize {
    records.iter().filter(|r| r.severity == severity).count()
}
