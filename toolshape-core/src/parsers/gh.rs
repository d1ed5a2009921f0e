// toolshape-core/src/parsers/gh.rs

//! `gh pr checks` in its non-TTY, tab-separated form.

use super::{RawOutput, ToolParser};
use crate::assemble::dedup_by_precedence;
use crate::errors::ParseError;
use crate::models::checks::{CheckRecord, CheckState, ChecksResult};
use crate::tokenize::{non_empty, split_record};
use tracing::{debug, trace};

const CHECK_FIELDS: usize = 5;

fn parse_check(line: &str) -> Result<Option<CheckRecord>, ParseError> {
    let fields = split_record(line, "\t", CHECK_FIELDS)?;
    if fields.len() < 2 {
        return Ok(None);
    }
    let Some(name) = non_empty(fields[0]) else {
        return Ok(None);
    };
    let Some(state) = CheckState::from_label(fields[1]) else {
        trace!(state = fields[1], "Skipping check with unknown state");
        return Ok(None);
    };
    let field = |idx: usize| fields.get(idx).and_then(|f| non_empty(f));
    Ok(Some(CheckRecord {
        name,
        state,
        elapsed: field(2),
        link: field(3),
        description: field(4),
    }))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GhChecksParser;

impl ToolParser for GhChecksParser {
    type Output = ChecksResult;

    fn tool(&self) -> &'static str {
        "gh pr checks"
    }

    fn parse(&self, raw: &RawOutput) -> Result<ChecksResult, ParseError> {
        let mut checks = Vec::new();
        for line in raw.stdout.lines() {
            if let Some(check) = parse_check(line)? {
                checks.push(check);
            }
        }
        let checks = dedup_by_precedence(checks, |c| c.name.clone(), |c| c.state.precedence());
        debug!(checks = checks.len(), "Parsed gh pr checks");
        Ok(ChecksResult::new(raw.meta(), checks))
    }
}
