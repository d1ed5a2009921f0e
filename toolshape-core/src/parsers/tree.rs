// toolshape-core/src/parsers/tree.rs

//! `cargo tree` listings.

use super::{RawOutput, ToolParser};
use crate::errors::ParseError;
use crate::models::tables::{TreeNode, TreeResult};
use crate::tokenize::depth_for;
use tracing::{debug, trace};

/// Width of one nesting level: `├── `, `│   ` and `    ` are all four chars.
const INDENT_UNIT: usize = 4;

/// Parenthesised markers that describe the crate rather than where it
/// comes from.
const MARKERS: &[&str] = &["proc-macro"];

fn is_prefix_char(c: char) -> bool {
    matches!(c, '│' | '├' | '└' | '─' | '|' | '`' | '-' | ' ' | '\u{a0}')
}

/// Every `( ... )` group in `rest`, outermost only.
fn paren_groups(rest: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in rest.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = idx + 1;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    groups.push(&rest[start..idx]);
                }
            }
            _ => {}
        }
    }
    groups
}

fn parse_node(line: &str) -> Option<TreeNode> {
    let prefix = line.chars().take_while(|c| is_prefix_char(*c)).count();
    let body: String = line.chars().skip(prefix).collect();
    let mut tokens = body.splitn(3, ' ');
    let name = tokens.next().filter(|n| !n.is_empty())?;
    let version = tokens
        .next()
        .and_then(|v| v.strip_prefix('v'))
        .filter(|v| v.starts_with(|c: char| c.is_ascii_digit()))?;
    let rest = tokens.next().unwrap_or("");

    let mut source = None;
    let mut repeated = false;
    for group in paren_groups(rest) {
        match group.trim() {
            "*" => repeated = true,
            g if MARKERS.contains(&g) => {}
            g if !g.is_empty() && source.is_none() => source = Some(g.to_string()),
            _ => {}
        }
    }
    Some(TreeNode {
        name: name.to_string(),
        version: version.to_string(),
        depth: depth_for(prefix, INDENT_UNIT),
        source,
        repeated,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CargoTreeParser;

impl ToolParser for CargoTreeParser {
    type Output = TreeResult;

    fn tool(&self) -> &'static str {
        "cargo tree"
    }

    fn parse(&self, raw: &RawOutput) -> Result<TreeResult, ParseError> {
        let mut nodes = Vec::new();
        for line in raw.stdout.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
                continue;
            }
            match parse_node(line) {
                Some(node) => nodes.push(node),
                None => trace!(line, "Skipping unrecognized cargo tree line"),
            }
        }
        debug!(nodes = nodes.len(), "Parsed cargo tree");
        Ok(TreeResult::new(raw.meta(), nodes))
    }
}
