// toolshape-core/src/tokenize.rs

//! Splits raw tool output into logical records.
//!
//! Four shapes cover every supported tool: plain lines, JSON lines,
//! delimiter-joined tuples and column tables (pipe-drawn or space-aligned).
//! Nothing here knows about a particular tool.

use crate::errors::ParseError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

/// Which captured stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Stdout,
    Stderr,
}

/// Lines of stdout followed by lines of stderr, tagged with their source.
///
/// Merge order is source first, then position within the source.
pub fn merged_lines<'a>(
    stdout: &'a str,
    stderr: &'a str,
) -> impl Iterator<Item = (Source, &'a str)> + 'a {
    stdout
        .lines()
        .map(|l| (Source::Stdout, l))
        .chain(stderr.lines().map(|l| (Source::Stderr, l)))
}

/// Decodes one JSON object per line into `T`.
///
/// Blank lines, non-JSON lines and objects that don't fit `T` are skipped.
/// Tools interleave plain text with their JSON stream, so a bad line is
/// never fatal.
pub fn json_lines<T: DeserializeOwned>(text: &str) -> Vec<T> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            if !trimmed.is_empty() {
                trace!(line = idx + 1, "Skipping non-JSON line");
            }
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(value) => out.push(value),
            Err(e) => trace!(line = idx + 1, error = %e, "Skipping malformed JSON line"),
        }
    }
    out
}

/// Splits `line` into at most `fields` pieces on `delimiter`.
///
/// Everything after the `fields - 1`th delimiter stays in the last piece
/// verbatim, delimiters included, so a free-text trailing field survives
/// any number of delimiter occurrences.
pub fn split_record<'a>(
    line: &'a str,
    delimiter: &str,
    fields: usize,
) -> Result<Vec<&'a str>, ParseError> {
    if delimiter.is_empty() {
        return Err(ParseError::InvalidOption(
            "record delimiter must not be empty".to_string(),
        ));
    }
    if fields == 0 {
        return Err(ParseError::InvalidOption(
            "record field count must be at least 1".to_string(),
        ));
    }
    Ok(line.splitn(fields, delimiter).collect())
}

/// Returns `Some(field)` for a non-empty field, `None` otherwise.
pub fn non_empty(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Column boundaries taken from a space-aligned header row.
///
/// Titles are separated by two or more spaces; a single space belongs to
/// the title (`CONTAINER ID`). Offsets are counted in chars because cells
/// may hold multi-byte text such as `…`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub titles: Vec<String>,
    starts: Vec<usize>,
}

impl ColumnLayout {
    pub fn from_header(header: &str) -> Option<Self> {
        let chars: Vec<char> = header.trim_end().chars().collect();
        let mut titles = Vec::new();
        let mut starts = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == ' ' {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() {
                let double_space =
                    chars[i] == ' ' && (i + 1 >= chars.len() || chars[i + 1] == ' ');
                if double_space {
                    break;
                }
                i += 1;
            }
            let title: String = chars[start..i].iter().collect();
            titles.push(title.trim().to_string());
            starts.push(start);
        }
        if titles.is_empty() {
            None
        } else {
            Some(Self { titles, starts })
        }
    }

    /// Slices one data row into trimmed cells, one per column.
    pub fn cells(&self, row: &str) -> Vec<String> {
        let chars: Vec<char> = row.chars().collect();
        let mut cells = Vec::with_capacity(self.starts.len());
        for (idx, &start) in self.starts.iter().enumerate() {
            let end = self
                .starts
                .get(idx + 1)
                .copied()
                .unwrap_or(chars.len())
                .min(chars.len());
            let start = start.min(chars.len());
            let cell: String = chars[start..end.max(start)].iter().collect();
            cells.push(cell.trim().to_string());
        }
        cells
    }

    pub fn index_of(&self, title: &str) -> Option<usize> {
        self.titles.iter().position(|t| t.eq_ignore_ascii_case(title))
    }
}

/// A table drawn with `|` column separators and dashed rule rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PipeTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }
}

fn is_rule_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | '|' | '+' | ':' | '=' | ' '))
}

/// Finds the first pipe table in `text`: the first non-rule row containing
/// `|` is the header, every later `|` row that isn't a rule is data.
///
/// Cells keep their interior text; only surrounding padding is removed.
/// Leading spaces of the first cell are significant for nested file
/// listings, so they are reported separately by [`leading_indent`].
pub fn pipe_table(text: &str) -> Option<PipeTable> {
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for line in text.lines() {
        if !line.contains('|') || is_rule_row(line) {
            continue;
        }
        let cells: Vec<String> = line.split('|').map(|c| c.to_string()).collect();
        match headers {
            None => headers = Some(cells.iter().map(|c| c.trim().to_string()).collect()),
            Some(_) => rows.push(cells),
        }
    }
    headers.map(|headers| PipeTable { headers, rows })
}

/// Count of leading space characters in `cell`.
pub fn leading_indent(cell: &str) -> usize {
    cell.chars().take_while(|c| *c == ' ').count()
}

/// Maps an indentation width to a tree depth: `width / unit`.
pub fn depth_for(width: usize, unit: usize) -> usize {
    if unit == 0 {
        0
    } else {
        width / unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Event {
        kind: String,
    }

    #[test]
    fn test_merged_lines_keeps_source_order() {
        let merged: Vec<_> = merged_lines("a\nb", "c").collect();
        assert_eq!(
            merged,
            vec![
                (Source::Stdout, "a"),
                (Source::Stdout, "b"),
                (Source::Stderr, "c")
            ]
        );
    }

    #[test]
    fn test_json_lines_skips_garbage() {
        let text = "{\"kind\":\"a\"}\nnot json\n{\"kind\":\n\n{\"other\":1}\n{\"kind\":\"b\"}\n";
        let events: Vec<Event> = json_lines(text);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, "b");
    }

    #[test]
    fn test_split_record_rejoins_trailing_field() {
        let line = "a<|>b<|>c<|>d<|>e<|>msg <|> with <|> delims";
        let fields = split_record(line, "<|>", 6).unwrap();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[5], "msg <|> with <|> delims");
    }

    #[test]
    fn test_split_record_short_line() {
        let fields = split_record("a<|>b", "<|>", 6).unwrap();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_split_record_rejects_empty_delimiter() {
        assert!(split_record("abc", "", 3).is_err());
        assert!(split_record("abc", ",", 0).is_err());
    }

    #[test]
    fn test_column_layout_multiword_titles() {
        let header = "CONTAINER ID   IMAGE     COMMAND   NAMES";
        let layout = ColumnLayout::from_header(header).unwrap();
        assert_eq!(layout.titles, vec!["CONTAINER ID", "IMAGE", "COMMAND", "NAMES"]);
        let row = "abc123         nginx     \"nginx…\"  web";
        let cells = layout.cells(row);
        assert_eq!(cells, vec!["abc123", "nginx", "\"nginx…\"", "web"]);
    }

    #[test]
    fn test_pipe_table_header_and_rows() {
        let text = "---|---\nFile | % Lines\n---|---\nAll files | 50\n a.js | 50\n---|---\n";
        let table = pipe_table(text).unwrap();
        assert_eq!(table.headers, vec!["File", "% Lines"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(leading_indent(&table.rows[1][0]), 1);
        assert_eq!(table.column("% lines"), Some(1));
    }

    #[test]
    fn test_depth_for() {
        assert_eq!(depth_for(0, 4), 0);
        assert_eq!(depth_for(8, 4), 2);
        assert_eq!(depth_for(8, 0), 0);
    }
}
