// toolshape-cli/src/rendering.rs

//! Terminal output for rendered results and scores.

use anyhow::{Context, Result};
use colored::*;
use toolshape_core::{OutputFormat, Rendered, Scored, VulnSeverity};

/// Colors one summary line by the severity it starts with.
fn color_line(line: &str) -> ColoredString {
    if line.starts_with("error") {
        line.red()
    } else if line.starts_with("warning") {
        line.yellow()
    } else {
        line.normal()
    }
}

pub fn format_human(rendered: &Rendered) -> String {
    let mut lines = rendered.summary.lines();
    let mut out = String::new();
    if let Some(headline) = lines.next() {
        let headline = if rendered.success {
            headline.green().bold()
        } else {
            headline.red().bold()
        };
        out.push_str(&headline.to_string());
    }
    for line in lines {
        out.push('\n');
        out.push_str(&format!("  {}", color_line(line)));
    }
    out
}

pub fn format_rendered(rendered: &Rendered, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&rendered.value)
            .context("Failed to serialize result as JSON"),
        OutputFormat::Human => Ok(format_human(rendered)),
    }
}

fn severity_color(severity: VulnSeverity, text: &str) -> ColoredString {
    match severity {
        VulnSeverity::Critical => text.red().bold(),
        VulnSeverity::High => text.red(),
        VulnSeverity::Medium => text.yellow(),
        VulnSeverity::Low => text.cyan(),
        VulnSeverity::Informational => text.normal(),
        VulnSeverity::Unknown => text.dimmed(),
    }
}

pub fn format_score(scored: &Scored, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(scored).context("Failed to serialize score as JSON")
        }
        OutputFormat::Human => {
            let label = severity_color(scored.severity, scored.severity.as_str());
            Ok(match scored.score {
                Some(score) => format!("{} ({:.1})", label, score),
                None => label.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolshape_core::{parse_any, severity_for, ParseOptions, RawOutput, ToolKind};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_human_output_lists_diagnostics() {
        plain();
        let raw = RawOutput::new(
            "src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.\n",
            "",
            2,
        )
        .with_elapsed(1.5);
        let rendered = parse_any(ToolKind::Tsc, &raw, &ParseOptions::default()).unwrap();
        let text = format_human(&rendered);
        assert_eq!(
            text,
            "tsc: build failed in 1.50s\n  error[2322] src/index.ts:10:5 Type 'string' is not assignable to type 'number'."
        );
    }

    #[test]
    fn test_json_output_is_tagged() {
        let raw = RawOutput::new("## main\n", "", 0);
        let rendered = parse_any(ToolKind::GitStatus, &raw, &ParseOptions::default()).unwrap();
        let json = format_rendered(&rendered, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["shape"], "full");
    }

    #[test]
    fn test_score_formats() {
        plain();
        let scored = severity_for("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H");
        assert_eq!(format_score(&scored, OutputFormat::Human).unwrap(), "critical (9.8)");
        let json = format_score(&scored, OutputFormat::Json).unwrap();
        assert!(json.contains("\"critical\""));

        let unknown = severity_for("AV:N/AC:L");
        assert_eq!(format_score(&unknown, OutputFormat::Human).unwrap(), "unknown");
    }
}
