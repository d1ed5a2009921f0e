// toolshape-core/src/scoring.rs

//! CVSS base-score computation and severity classification.
//!
//! Supports CVSS v3.0/v3.1 (`CVSS:3.1/AV:N/...`) and CVSS v2
//! (`AV:N/AC:L/Au:N/C:P/I:P/A:P`). Both versions finish with the same
//! round-up-to-one-decimal step. Any vector that is missing a base metric,
//! repeats one, or carries an unknown value has no score.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Severity class of a vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnSeverity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
    Unknown,
}

impl VulnSeverity {
    /// Maps advisory-database severity words (`moderate`, `info`, ...).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => VulnSeverity::Critical,
            "high" => VulnSeverity::High,
            "medium" | "moderate" => VulnSeverity::Medium,
            "low" => VulnSeverity::Low,
            "informational" | "info" | "none" => VulnSeverity::Informational,
            _ => VulnSeverity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnSeverity::Critical => "critical",
            VulnSeverity::High => "high",
            VulnSeverity::Medium => "medium",
            VulnSeverity::Low => "low",
            VulnSeverity::Informational => "informational",
            VulnSeverity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VulnSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A severity class together with the score it came from, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scored {
    pub severity: VulnSeverity,
    pub score: Option<f64>,
}

/// Classifies a 0.0–10.0 score. Boundaries are closed at 9.0, 7.0 and 4.0.
pub fn classify(score: f64) -> VulnSeverity {
    if !(0.0..=10.0).contains(&score) || score.is_nan() {
        VulnSeverity::Unknown
    } else if score >= 9.0 {
        VulnSeverity::Critical
    } else if score >= 7.0 {
        VulnSeverity::High
    } else if score >= 4.0 {
        VulnSeverity::Medium
    } else if score > 0.0 {
        VulnSeverity::Low
    } else {
        VulnSeverity::Informational
    }
}

/// Scores a plain number or a CVSS vector string.
pub fn severity_for(descriptor: &str) -> Scored {
    let trimmed = descriptor.trim();
    let score = match trimmed.parse::<f64>() {
        Ok(n) if (0.0..=10.0).contains(&n) => Some(n),
        Ok(_) => None,
        Err(_) => score_vector(trimmed),
    };
    match score {
        Some(s) => Scored {
            severity: classify(s),
            score: Some(s),
        },
        None => Scored {
            severity: VulnSeverity::Unknown,
            score: None,
        },
    }
}

/// Base score of a CVSS v2 or v3.x vector, or `None` when it can't be
/// computed exactly.
pub fn score_vector(vector: &str) -> Option<f64> {
    let vector = vector.trim();
    let score = if let Some(rest) = vector
        .strip_prefix("CVSS:3.1/")
        .or_else(|| vector.strip_prefix("CVSS:3.0/"))
    {
        score_v3(rest)
    } else if let Some(rest) = vector.strip_prefix("CVSS:2.0/") {
        score_v2(rest)
    } else if !vector.starts_with("CVSS:") {
        let bare = vector
            .strip_prefix('(')
            .and_then(|v| v.strip_suffix(')'))
            .unwrap_or(vector);
        score_v2(bare)
    } else {
        None
    };
    debug!(vector = vector, score = ?score, "Scored CVSS vector");
    score
}

/// `ceil(x * 10) / 10`, evaluated on an integer-scaled value so that a
/// float like 4.000000000000001 still lands on 4.0.
pub fn round_up_tenth(x: f64) -> f64 {
    let scaled = (x * 100_000.0).round() as i64;
    if scaled % 10_000 == 0 {
        scaled as f64 / 100_000.0
    } else {
        ((scaled / 10_000) + 1) as f64 / 10.0
    }
}

const V3_OPTIONAL: &[&str] = &[
    "E", "RL", "RC", "CR", "IR", "AR", "MAV", "MAC", "MPR", "MUI", "MS", "MC", "MI", "MA",
];
const V2_OPTIONAL: &[&str] = &["E", "RL", "RC", "CDP", "TD", "CR", "IR", "AR"];

fn metrics<'a>(body: &'a str, base: &[&str], optional: &[&str]) -> Option<HashMap<&'a str, &'a str>> {
    let mut map = HashMap::new();
    for part in body.split('/') {
        let (key, value) = part.split_once(':')?;
        if !base.contains(&key) && !optional.contains(&key) {
            return None;
        }
        if map.insert(key, value).is_some() {
            return None;
        }
    }
    if base.iter().all(|k| map.contains_key(k)) {
        Some(map)
    } else {
        None
    }
}

fn score_v3(body: &str) -> Option<f64> {
    let m = metrics(body, &["AV", "AC", "PR", "UI", "S", "C", "I", "A"], V3_OPTIONAL)?;
    let scope_changed = match m["S"] {
        "U" => false,
        "C" => true,
        _ => return None,
    };
    let av = match m["AV"] {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => return None,
    };
    let ac = match m["AC"] {
        "L" => 0.77,
        "H" => 0.44,
        _ => return None,
    };
    let pr = match (m["PR"], scope_changed) {
        ("N", _) => 0.85,
        ("L", false) => 0.62,
        ("L", true) => 0.68,
        ("H", false) => 0.27,
        ("H", true) => 0.5,
        _ => return None,
    };
    let ui = match m["UI"] {
        "N" => 0.85,
        "R" => 0.62,
        _ => return None,
    };
    let cia = |v: &str| match v {
        "H" => Some(0.56),
        "L" => Some(0.22),
        "N" => Some(0.0),
        _ => None,
    };
    let (c, i, a) = (cia(m["C"])?, cia(m["I"])?, cia(m["A"])?);

    let iss = 1.0 - (1.0 - c) * (1.0 - i) * (1.0 - a);
    let impact = if scope_changed {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02_f64).powi(15)
    } else {
        6.42 * iss
    };
    let exploitability = 8.22 * av * ac * pr * ui;

    if impact <= 0.0 {
        return Some(0.0);
    }
    let raw = if scope_changed {
        (1.08 * (impact + exploitability)).min(10.0)
    } else {
        (impact + exploitability).min(10.0)
    };
    Some(round_up_tenth(raw))
}

fn score_v2(body: &str) -> Option<f64> {
    let m = metrics(body, &["AV", "AC", "Au", "C", "I", "A"], V2_OPTIONAL)?;
    let av = match m["AV"] {
        "L" => 0.395,
        "A" => 0.646,
        "N" => 1.0,
        _ => return None,
    };
    let ac = match m["AC"] {
        "H" => 0.35,
        "M" => 0.61,
        "L" => 0.71,
        _ => return None,
    };
    let au = match m["Au"] {
        "M" => 0.45,
        "S" => 0.56,
        "N" => 0.704,
        _ => return None,
    };
    let cia = |v: &str| match v {
        "N" => Some(0.0),
        "P" => Some(0.275),
        "C" => Some(0.660),
        _ => None,
    };
    let (c, i, a) = (cia(m["C"])?, cia(m["I"])?, cia(m["A"])?);

    let impact = 10.41 * (1.0 - (1.0 - c) * (1.0 - i) * (1.0 - a));
    let exploitability = 20.0 * av * ac * au;
    let f_impact = if impact == 0.0 { 0.0 } else { 1.176 };
    let raw: f64 = ((0.6 * impact) + (0.4 * exploitability) - 1.5) * f_impact;
    Some(round_up_tenth(raw.clamp(0.0, 10.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v31_critical_example() {
        let scored = severity_for("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H");
        assert_eq!(scored.score, Some(9.8));
        assert_eq!(scored.severity, VulnSeverity::Critical);
    }

    #[test]
    fn test_v3_scope_changed() {
        // Log4Shell
        assert_eq!(
            score_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:H/A:H"),
            Some(10.0)
        );
        assert_eq!(
            score_vector("CVSS:3.0/AV:N/AC:L/PR:L/UI:N/S:C/C:L/I:L/A:N"),
            Some(6.4)
        );
    }

    #[test]
    fn test_v3_assorted_scores() {
        assert_eq!(score_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:U/C:H/I:H/A:H"), Some(8.8));
        assert_eq!(score_vector("CVSS:3.1/AV:N/AC:H/PR:N/UI:N/S:U/C:H/I:N/A:N"), Some(5.9));
        assert_eq!(score_vector("CVSS:3.1/AV:L/AC:L/PR:L/UI:N/S:U/C:L/I:N/A:N"), Some(3.3));
        assert_eq!(score_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:H"), Some(7.5));
    }

    #[test]
    fn test_v3_no_impact_is_zero() {
        let scored = severity_for("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:N");
        assert_eq!(scored.score, Some(0.0));
        assert_eq!(scored.severity, VulnSeverity::Informational);
    }

    #[test]
    fn test_v2_scores() {
        assert_eq!(score_vector("AV:N/AC:L/Au:N/C:P/I:P/A:P"), Some(7.5));
        assert_eq!(score_vector("(AV:N/AC:L/Au:N/C:C/I:C/A:C)"), Some(10.0));
        assert_eq!(score_vector("AV:N/AC:M/Au:N/C:N/I:P/A:N"), Some(4.3));
        assert_eq!(score_vector("AV:N/AC:L/Au:N/C:N/I:N/A:N"), Some(0.0));
        let scored = severity_for("AV:N/AC:L/Au:N/C:P/I:P/A:P");
        assert_eq!(scored.score, Some(7.5));
        assert_eq!(scored.severity, VulnSeverity::High);
    }

    #[test]
    fn test_incomplete_vectors_are_unknown() {
        assert_eq!(severity_for("AV:N/AC:L").severity, VulnSeverity::Unknown);
        assert_eq!(severity_for("AV:N/AC:L").score, None);
        assert_eq!(score_vector("CVSS:3.1/AV:N/AC:L"), None);
        assert_eq!(score_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:X/C:H/I:H/A:H"), None);
        assert_eq!(score_vector("CVSS:3.1/AV:N/AV:L/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"), None);
        assert_eq!(score_vector("CVSS:4.0/AV:N/AC:L/AT:N/PR:N/UI:N/VC:H/VI:H/VA:H/SC:N/SI:N/SA:N"), None);
        assert_eq!(severity_for("").severity, VulnSeverity::Unknown);
    }

    #[test]
    fn test_temporal_metrics_ignored_for_base() {
        assert_eq!(
            score_vector("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H/E:P/RL:O"),
            Some(9.8)
        );
    }

    #[test]
    fn test_classify_boundaries_closed() {
        assert_eq!(classify(10.0), VulnSeverity::Critical);
        assert_eq!(classify(9.0), VulnSeverity::Critical);
        assert_eq!(classify(8.9), VulnSeverity::High);
        assert_eq!(classify(7.0), VulnSeverity::High);
        assert_eq!(classify(6.9), VulnSeverity::Medium);
        assert_eq!(classify(4.0), VulnSeverity::Medium);
        assert_eq!(classify(3.9), VulnSeverity::Low);
        assert_eq!(classify(0.1), VulnSeverity::Low);
        assert_eq!(classify(0.0), VulnSeverity::Informational);
        assert_eq!(classify(10.5), VulnSeverity::Unknown);
    }

    #[test]
    fn test_plain_numeric_descriptor() {
        let scored = severity_for("7.5");
        assert_eq!(scored.score, Some(7.5));
        assert_eq!(scored.severity, VulnSeverity::High);
        assert_eq!(severity_for("11").severity, VulnSeverity::Unknown);
    }

    #[test]
    fn test_round_up_tenth_is_directional() {
        assert_eq!(round_up_tenth(4.02), 4.1);
        assert_eq!(round_up_tenth(4.0), 4.0);
        assert_eq!(round_up_tenth(4.000000000000001), 4.0);
        assert_eq!(round_up_tenth(9.760161495), 9.8);
    }

    #[test]
    fn test_scores_stay_in_range() {
        for av in ["N", "A", "L", "P"] {
            for s in ["U", "C"] {
                for c in ["H", "L", "N"] {
                    let v = format!("CVSS:3.1/AV:{}/AC:L/PR:H/UI:R/S:{}/C:{}/I:H/A:L", av, s, c);
                    let score = score_vector(&v).unwrap();
                    assert!((0.0..=10.0).contains(&score), "{} -> {}", v, score);
                }
            }
        }
    }

    #[test]
    fn test_from_label() {
        assert_eq!(VulnSeverity::from_label("Moderate"), VulnSeverity::Medium);
        assert_eq!(VulnSeverity::from_label("info"), VulnSeverity::Informational);
        assert_eq!(VulnSeverity::from_label("whatever"), VulnSeverity::Unknown);
    }
}
