// toolshape-core/src/parsers/coverage.rs

//! istanbul / nyc `text` reporter tables.

use super::{RawOutput, ToolParser};
use crate::errors::ParseError;
use crate::models::tables::{CoverageRecord, CoverageResult};
use crate::tokenize::{depth_for, leading_indent, non_empty, pipe_table, PipeTable};
use tracing::{debug, trace};

const SUMMARY_ROW: &str = "All files";

/// Column positions of the fields we read, by header name with the
/// reporter's default order as the fallback.
struct Columns {
    statements: usize,
    branches: usize,
    functions: usize,
    lines: usize,
    uncovered: usize,
}

impl Columns {
    fn locate(table: &PipeTable) -> Self {
        let find = |name: &str, fallback: usize| table.column(name).unwrap_or(fallback);
        Self {
            statements: find("% Stmts", 1),
            branches: find("% Branch", 2),
            functions: find("% Funcs", 3),
            lines: find("% Lines", 4),
            uncovered: find("Uncovered Line #s", 5),
        }
    }
}

fn percent(row: &[String], idx: usize) -> Option<f64> {
    row.get(idx).and_then(|c| c.trim().parse::<f64>().ok())
}

fn to_record(row: &[String], columns: &Columns) -> Option<CoverageRecord> {
    let first = row.first()?;
    let file = non_empty(first)?;
    Some(CoverageRecord {
        depth: depth_for(leading_indent(first), 1),
        file,
        statements: percent(row, columns.statements),
        branches: percent(row, columns.branches),
        functions: percent(row, columns.functions),
        lines: percent(row, columns.lines),
        uncovered_lines: row.get(columns.uncovered).and_then(|c| non_empty(c)),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageParser;

impl ToolParser for CoverageParser {
    type Output = CoverageResult;

    fn tool(&self) -> &'static str {
        "coverage"
    }

    fn parse(&self, raw: &RawOutput) -> Result<CoverageResult, ParseError> {
        let Some(table) = pipe_table(&raw.stdout) else {
            trace!("No coverage table found");
            return Ok(CoverageResult::new(raw.meta(), None, Vec::new()));
        };
        let columns = Columns::locate(&table);
        let mut summary = None;
        let mut files = Vec::new();
        for row in &table.rows {
            let Some(mut record) = to_record(row, &columns) else {
                continue;
            };
            if record.file == SUMMARY_ROW {
                record.depth = 0;
                summary = Some(record);
            } else {
                files.push(record);
            }
        }
        debug!(files = files.len(), has_summary = summary.is_some(), "Parsed coverage table");
        Ok(CoverageResult::new(raw.meta(), summary, files))
    }
}
