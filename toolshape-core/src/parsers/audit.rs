// toolshape-core/src/parsers/audit.rs

//! `cargo audit --json` report.
//!
//! The report is one JSON document. When it cannot be read the parser does
//! not fail: it hands back a degraded [`AuditResult`] with `success: false`
//! and empty lists, so callers always get a Result to show.

use super::{RawOutput, ToolParser};
use crate::errors::ParseError;
use crate::models::audit::{AuditResult, AuditWarning, VulnerabilityRecord};
use crate::scoring::{severity_for, VulnSeverity};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct Report {
    #[serde(default)]
    vulnerabilities: Option<Vulnerabilities>,
    #[serde(default)]
    warnings: BTreeMap<String, Vec<RawWarning>>,
}

#[derive(Deserialize, Debug)]
struct Vulnerabilities {
    #[serde(default)]
    found: Option<bool>,
    #[serde(default)]
    list: Vec<RawVulnerability>,
}

#[derive(Deserialize, Debug)]
struct RawVulnerability {
    advisory: Advisory,
    #[serde(default)]
    versions: Option<Versions>,
    package: Package,
}

#[derive(Deserialize, Debug)]
struct Advisory {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    cvss: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct Versions {
    #[serde(default)]
    patched: Vec<String>,
    #[serde(default)]
    unaffected: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
struct Package {
    name: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct RawWarning {
    #[serde(default)]
    kind: Option<String>,
    package: Package,
    #[serde(default)]
    advisory: Option<Advisory>,
}

/// CVSS vector first, then the advisory's own severity word.
fn vulnerability_severity(advisory: &Advisory) -> (VulnSeverity, Option<f64>) {
    if let Some(vector) = advisory.cvss.as_deref().filter(|v| !v.trim().is_empty()) {
        let scored = severity_for(vector);
        if scored.severity != VulnSeverity::Unknown {
            return (scored.severity, scored.score);
        }
    }
    let label = advisory
        .severity
        .as_deref()
        .map(VulnSeverity::from_label)
        .unwrap_or(VulnSeverity::Unknown);
    (label, None)
}

fn to_record(raw: RawVulnerability) -> VulnerabilityRecord {
    let (severity, cvss_score) = vulnerability_severity(&raw.advisory);
    let versions = raw.versions.unwrap_or_default();
    VulnerabilityRecord {
        id: raw.advisory.id,
        package: raw.package.name,
        version: raw.package.version,
        severity,
        cvss_score,
        title: raw.advisory.title,
        patched: versions.patched,
        unaffected: versions.unaffected,
        url: raw.advisory.url,
        aliases: raw.advisory.aliases,
    }
}

fn read_report(text: &str) -> Result<Report, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::MalformedDocument(
            "cargo audit printed no report".to_string(),
        ));
    }
    serde_json::from_str(trimmed).map_err(|e| ParseError::MalformedDocument(e.to_string()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CargoAuditParser;

impl ToolParser for CargoAuditParser {
    type Output = AuditResult;

    fn tool(&self) -> &'static str {
        "cargo audit"
    }

    fn parse(&self, raw: &RawOutput) -> Result<AuditResult, ParseError> {
        let report = match read_report(&raw.stdout) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Unreadable cargo audit report; returning degraded result");
                return Ok(AuditResult::degraded(raw.meta()));
            }
        };

        let (found, list) = match report.vulnerabilities {
            Some(v) => (v.found, v.list),
            None => (None, Vec::new()),
        };
        let vulnerabilities: Vec<VulnerabilityRecord> = list.into_iter().map(to_record).collect();
        let warnings: Vec<AuditWarning> = report
            .warnings
            .into_iter()
            .flat_map(|(group, items)| {
                items.into_iter().map(move |w| AuditWarning {
                    kind: w.kind.unwrap_or_else(|| group.clone()),
                    package: w.package.name,
                    version: w.package.version,
                    advisory_id: w.advisory.as_ref().map(|a| a.id.clone()),
                    title: w.advisory.map(|a| a.title).filter(|t| !t.is_empty()),
                })
            })
            .collect();

        debug!(
            vulnerabilities = vulnerabilities.len(),
            warnings = warnings.len(),
            "Parsed cargo audit report"
        );
        Ok(AuditResult::new(raw.meta(), vulnerabilities, warnings, found))
    }
}
