// toolshape-core/src/parsers/git.rs

//! `git log`, `git status --porcelain=v1 --branch` and `git diff --numstat`.

use super::{RawOutput, ToolParser};
use crate::errors::ParseError;
use crate::models::vcs::{
    BranchInfo, ChangeKind, CommitRecord, DiffFileRecord, DiffResult, LogResult, StatusEntry,
    StatusResult,
};
use crate::tokenize::{non_empty, split_record};
use tracing::{debug, trace};

/// Field separator used in the requested `git log` format when the caller
/// doesn't pick one.
pub const DEFAULT_LOG_DELIMITER: &str = "<|>";

const LOG_FIELDS: usize = 6;

/// Reads `git log` output produced with [`GitLogParser::command_args`].
#[derive(Debug, Clone, PartialEq)]
pub struct GitLogParser {
    delimiter: String,
}

impl Default for GitLogParser {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_DELIMITER.to_string())
    }
}

impl GitLogParser {
    pub fn new(delimiter: String) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Arguments for `git` that print one NUL-terminated record per commit
    /// in the layout [`ToolParser::parse`] expects.
    pub fn command_args(&self) -> Vec<String> {
        let d = &self.delimiter;
        vec![
            "log".to_string(),
            "-z".to_string(),
            "--date=iso-strict".to_string(),
            format!("--pretty=format:%H{d}%h{d}%an <%ae>{d}%ad{d}%D{d}%B"),
        ]
    }

    fn parse_record(&self, record: &str) -> Result<Option<CommitRecord>, ParseError> {
        let fields = split_record(record, &self.delimiter, LOG_FIELDS)?;
        if fields.len() < LOG_FIELDS {
            trace!(fields = fields.len(), "Skipping short git log record");
            return Ok(None);
        }
        let hash = fields[0].trim();
        if hash.is_empty() {
            return Ok(None);
        }
        let (author, email) = split_author(fields[2]);
        let refs = fields[4]
            .split(", ")
            .filter_map(non_empty)
            .collect();
        Ok(Some(CommitRecord {
            hash: hash.to_string(),
            short_hash: fields[1].trim().to_string(),
            author,
            email,
            date: fields[3].trim().to_string(),
            refs,
            message: fields[5].trim_end_matches('\n').to_string(),
        }))
    }
}

/// `Name <email>` into its two halves. An empty address yields no email.
fn split_author(field: &str) -> (String, Option<String>) {
    let field = field.trim();
    if let Some(stripped) = field.strip_suffix('>') {
        if let Some(idx) = stripped.rfind('<') {
            let name = stripped[..idx].trim().to_string();
            return (name, non_empty(&stripped[idx + 1..]));
        }
    }
    (field.to_string(), None)
}

impl ToolParser for GitLogParser {
    type Output = LogResult;

    fn tool(&self) -> &'static str {
        "git log"
    }

    fn parse(&self, raw: &RawOutput) -> Result<LogResult, ParseError> {
        if self.delimiter.is_empty() {
            return Err(ParseError::InvalidOption(
                "git log delimiter must not be empty".to_string(),
            ));
        }
        // `-z` output separates commits with NUL, which lets messages span
        // lines. Without it every line is one commit.
        let records: Vec<&str> = if raw.stdout.contains('\0') {
            raw.stdout.split('\0').collect()
        } else {
            raw.stdout.lines().collect()
        };
        let mut commits = Vec::new();
        for record in records {
            let record = record.trim_start_matches('\n');
            if record.trim().is_empty() {
                continue;
            }
            if let Some(commit) = self.parse_record(record)? {
                commits.push(commit);
            }
        }
        debug!(commits = commits.len(), "Parsed git log");
        Ok(LogResult::new(raw.meta(), commits))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GitStatusParser;

fn parse_branch_header(header: &str) -> BranchInfo {
    let mut info = BranchInfo::default();
    if let Some(name) = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
    {
        info.branch = non_empty(name);
        return info;
    }
    if header.starts_with("HEAD (no branch)") {
        return info;
    }
    let (names, tracking) = match header.find(" [") {
        Some(idx) => (&header[..idx], Some(header[idx + 2..].trim_end_matches(']'))),
        None => (header, None),
    };
    match names.split_once("...") {
        Some((branch, upstream)) => {
            info.branch = non_empty(branch);
            info.upstream = non_empty(upstream);
        }
        None => info.branch = non_empty(names),
    }
    for part in tracking.into_iter().flat_map(|t| t.split(", ")) {
        if part == "gone" {
            info.upstream_gone = true;
        } else if let Some(n) = part.strip_prefix("ahead ") {
            info.ahead = n.trim().parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            info.behind = n.trim().parse().unwrap_or(0);
        }
    }
    info
}

fn change_kind(index: char, worktree: char) -> ChangeKind {
    match (index, worktree) {
        ('?', '?') => ChangeKind::Untracked,
        ('!', '!') => ChangeKind::Ignored,
        ('D', 'D') | ('A', 'U') | ('U', 'D') | ('U', 'A') | ('D', 'U') | ('A', 'A')
        | ('U', 'U') => ChangeKind::Conflicted,
        (i, w) if i != ' ' && w != ' ' => ChangeKind::Both,
        (' ', _) => ChangeKind::Unstaged,
        _ => ChangeKind::Staged,
    }
}

/// Undoes git's C-style path quoting: `"a\tb\303\251.txt"`.
fn unquote(path: &str) -> String {
    let inner = match path
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    {
        Some(inner) => inner,
        None => return path.to_string(),
    };
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('a') => bytes.push(0x07),
            Some('b') => bytes.push(0x08),
            Some('f') => bytes.push(0x0c),
            Some('v') => bytes.push(0x0b),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(next) => {
                            value = value * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Splits `orig -> path`, honouring a quoted first path that may itself
/// contain ` -> `.
fn split_rename(rest: &str) -> (Option<&str>, &str) {
    let search_from = if rest.starts_with('"') {
        let mut escaped = false;
        let mut end = None;
        for (idx, c) in rest.char_indices().skip(1) {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    end = Some(idx + 1);
                    break;
                }
                _ => escaped = false,
            }
        }
        end.unwrap_or(0)
    } else {
        0
    };
    match rest[search_from..].find(" -> ") {
        Some(idx) => {
            let at = search_from + idx;
            (Some(&rest[..at]), &rest[at + 4..])
        }
        None => (None, rest),
    }
}

fn parse_status_line(line: &str) -> Option<StatusEntry> {
    let bytes = line.as_bytes();
    if bytes.len() < 4 || bytes[2] != b' ' || !bytes[0].is_ascii() || !bytes[1].is_ascii() {
        return None;
    }
    let index = bytes[0] as char;
    let worktree = bytes[1] as char;
    let rest = &line[3..];
    let (orig, path) = if matches!(index, 'R' | 'C') || matches!(worktree, 'R' | 'C') {
        split_rename(rest)
    } else {
        (None, rest)
    };
    Some(StatusEntry {
        path: unquote(path),
        orig_path: orig.map(unquote),
        index,
        worktree,
        kind: change_kind(index, worktree),
    })
}

impl ToolParser for GitStatusParser {
    type Output = StatusResult;

    fn tool(&self) -> &'static str {
        "git status"
    }

    fn parse(&self, raw: &RawOutput) -> Result<StatusResult, ParseError> {
        let mut branch = BranchInfo::default();
        let mut entries = Vec::new();
        for line in raw.stdout.lines() {
            if let Some(header) = line.strip_prefix("## ") {
                branch = parse_branch_header(header);
                continue;
            }
            match parse_status_line(line) {
                Some(entry) => entries.push(entry),
                None if line.trim().is_empty() => {}
                None => trace!(line, "Skipping unrecognized status line"),
            }
        }
        debug!(entries = entries.len(), branch = ?branch.branch, "Parsed git status");
        Ok(StatusResult::new(raw.meta(), branch, entries))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GitDiffParser;

/// Resolves numstat rename notation into `(old_path, path)`.
fn resolve_rename(path: &str) -> (Option<String>, String) {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            if let Some((old, new)) = path[open + 1..close].split_once(" => ") {
                let prefix = &path[..open];
                let suffix = &path[close + 1..];
                let join = |middle: &str| {
                    format!("{}{}{}", prefix, middle, suffix).replace("//", "/")
                };
                return (Some(join(old)), join(new));
            }
        }
    }
    match path.split_once(" => ") {
        Some((old, new)) => (Some(old.to_string()), new.to_string()),
        None => (None, path.to_string()),
    }
}

fn parse_numstat_line(line: &str) -> Result<Option<DiffFileRecord>, ParseError> {
    let fields = split_record(line, "\t", 3)?;
    if fields.len() < 3 || fields[2].is_empty() {
        return Ok(None);
    }
    let binary = fields[0] == "-" && fields[1] == "-";
    let (additions, deletions) = if binary {
        (None, None)
    } else {
        match (fields[0].parse::<u64>(), fields[1].parse::<u64>()) {
            (Ok(a), Ok(d)) => (Some(a), Some(d)),
            _ => return Ok(None),
        }
    };
    let (old_path, path) = resolve_rename(fields[2]);
    Ok(Some(DiffFileRecord {
        path,
        old_path,
        additions,
        deletions,
        binary,
    }))
}

impl ToolParser for GitDiffParser {
    type Output = DiffResult;

    fn tool(&self) -> &'static str {
        "git diff"
    }

    fn parse(&self, raw: &RawOutput) -> Result<DiffResult, ParseError> {
        let mut files = Vec::new();
        for line in raw.stdout.lines() {
            match parse_numstat_line(line)? {
                Some(file) => files.push(file),
                None if line.trim().is_empty() => {}
                None => trace!(line, "Skipping unrecognized numstat line"),
            }
        }
        debug!(files = files.len(), "Parsed git diff --numstat");
        Ok(DiffResult::new(raw.meta(), files))
    }
}
