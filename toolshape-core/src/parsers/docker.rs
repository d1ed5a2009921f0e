// toolshape-core/src/parsers/docker.rs

//! `docker ps` and `docker images` tables.

use super::{RawOutput, ToolParser};
use crate::errors::ParseError;
use crate::models::tables::{
    ContainerRecord, ContainerResult, ContainerState, ImageRecord, ImageResult,
};
use crate::tokenize::{non_empty, ColumnLayout};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

lazy_static! {
    static ref EXIT_CODE: Regex =
        Regex::new(r"^\w+ \((?P<code>-?\d+)\)").expect("valid exit code regex");
}

/// Converts a docker size string (`72.8MB`, `512kB`, `1.2GB`) to bytes.
///
/// Docker prints sizes in SI units. The decimal is applied on the digit
/// string itself so `13.3kB` is exactly 13300.
pub fn parse_byte_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    let (number, unit) = text.split_at(split);
    let multiplier: u64 = match unit.trim() {
        "B" => 1,
        "kB" | "KB" | "k" | "K" => 1_000,
        "MB" | "M" => 1_000_000,
        "GB" | "G" => 1_000_000_000,
        "TB" | "T" => 1_000_000_000_000,
        _ => return None,
    };
    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut bytes = whole.checked_mul(multiplier)?;
    if !fraction.is_empty() {
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let scale = 10u64.checked_pow(fraction.len() as u32)?;
        let digits: u64 = fraction.parse().ok()?;
        bytes = bytes.checked_add(digits.checked_mul(multiplier)? / scale)?;
    }
    Some(bytes)
}

/// Reads the state out of a STATUS cell such as `Up 3 hours (Paused)` or
/// `Exited (137) 2 days ago`.
fn container_state(status: &str) -> (ContainerState, Option<i32>) {
    let exit_code = EXIT_CODE
        .captures(status)
        .and_then(|c| c["code"].parse().ok());
    let state = if status.starts_with("Up") {
        if status.contains("(Paused)") {
            ContainerState::Paused
        } else {
            ContainerState::Running
        }
    } else if status.starts_with("Exited") {
        ContainerState::Exited
    } else if status.starts_with("Restarting") {
        ContainerState::Restarting
    } else if status.starts_with("Created") {
        ContainerState::Created
    } else if status.starts_with("Dead") {
        ContainerState::Dead
    } else {
        ContainerState::Unknown
    };
    (state, exit_code)
}

/// Header layout plus the data rows below it.
fn table(stdout: &str) -> Option<(ColumnLayout, Vec<&str>)> {
    let mut lines = stdout.lines().skip_while(|l| l.trim().is_empty());
    let layout = ColumnLayout::from_header(lines.next()?)?;
    let rows = lines.filter(|l| !l.trim().is_empty()).collect();
    Some((layout, rows))
}

fn cell(cells: &[String], layout: &ColumnLayout, title: &str) -> String {
    layout
        .index_of(title)
        .and_then(|i| cells.get(i))
        .cloned()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DockerPsParser;

impl ToolParser for DockerPsParser {
    type Output = ContainerResult;

    fn tool(&self) -> &'static str {
        "docker ps"
    }

    fn parse(&self, raw: &RawOutput) -> Result<ContainerResult, ParseError> {
        let mut containers = Vec::new();
        let Some((layout, rows)) = table(&raw.stdout) else {
            return Ok(ContainerResult::new(raw.meta(), containers));
        };
        if layout.index_of("CONTAINER ID").is_none() {
            trace!(titles = ?layout.titles, "Not a docker ps header");
            return Ok(ContainerResult::new(raw.meta(), containers));
        }
        for row in rows {
            let cells = layout.cells(row);
            let id = cell(&cells, &layout, "CONTAINER ID");
            if id.is_empty() {
                continue;
            }
            let status = cell(&cells, &layout, "STATUS");
            let (state, exit_code) = container_state(&status);
            let split_list = |title: &str, sep: &str| -> Vec<String> {
                cell(&cells, &layout, title)
                    .split(sep)
                    .filter_map(non_empty)
                    .collect()
            };
            containers.push(ContainerRecord {
                id,
                image: cell(&cells, &layout, "IMAGE"),
                command: cell(&cells, &layout, "COMMAND").trim_matches('"').to_string(),
                created: cell(&cells, &layout, "CREATED"),
                status,
                state,
                exit_code,
                ports: split_list("PORTS", ", "),
                names: split_list("NAMES", ","),
            });
        }
        debug!(containers = containers.len(), "Parsed docker ps");
        Ok(ContainerResult::new(raw.meta(), containers))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DockerImagesParser;

fn none_marker(value: String) -> Option<String> {
    if value.is_empty() || value == "<none>" {
        None
    } else {
        Some(value)
    }
}

impl ToolParser for DockerImagesParser {
    type Output = ImageResult;

    fn tool(&self) -> &'static str {
        "docker images"
    }

    fn parse(&self, raw: &RawOutput) -> Result<ImageResult, ParseError> {
        let mut images = Vec::new();
        let Some((layout, rows)) = table(&raw.stdout) else {
            return Ok(ImageResult::new(raw.meta(), images));
        };
        if layout.index_of("IMAGE ID").is_none() {
            trace!(titles = ?layout.titles, "Not a docker images header");
            return Ok(ImageResult::new(raw.meta(), images));
        }
        for row in rows {
            let cells = layout.cells(row);
            let id = cell(&cells, &layout, "IMAGE ID");
            let size = cell(&cells, &layout, "SIZE");
            if id.is_empty() {
                continue;
            }
            let size_bytes = parse_byte_size(&size);
            if size_bytes.is_none() {
                trace!(row, size = %size, "Unreadable image size");
            }
            images.push(ImageRecord {
                repository: none_marker(cell(&cells, &layout, "REPOSITORY")),
                tag: none_marker(cell(&cells, &layout, "TAG")),
                id,
                created: cell(&cells, &layout, "CREATED"),
                size_bytes,
            });
        }
        debug!(images = images.len(), "Parsed docker images");
        Ok(ImageResult::new(raw.meta(), images))
    }
}
