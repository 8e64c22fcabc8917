//! Reader for project files.
//!
//! ```text
//! Name: alpha
//! Tags: client, urgent
//! Archived: no
//!
//! 2025-03-10 09:00-12:30
//!  - body lines start with whitespace
//! 2025-03-11 14:00-
//! ```
//!
//! The header is optional and ends at the first blank line. An entry without an end time is
//! still running. An end time before the start time means the entry went past midnight.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::{LogEntry, Project, ProjectError};

/// File name used for a project living at the root of its directory.
pub const PROJECT_FILE_NAME: &str = ".worklog";
pub const PROJECT_EXTENSION: &str = "worklog";

pub fn parse_project(path: &Path, text: &str, now: NaiveDateTime) -> Result<Project, ProjectError> {
    let parse_error = |index: usize, message: String| ProjectError::Parse {
        path: path.to_owned(),
        line: index + 1,
        message,
    };

    let mut project = Project::new(default_name(path), path);
    let mut lines = text.lines().enumerate().peekable();

    while let Some((index, line)) = lines.next_if(|(_, line)| is_header_line(line)) {
        if line.trim().is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(parse_error(
                index,
                format!("expected a 'Key: value' header line, found {line:?}"),
            ));
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "name" if !value.trim().is_empty() => project.name = value.trim().to_string(),
            "tags" => project.declared_tags.extend(split_tags(value)),
            "archived" => project.archived = parse_flag(value),
            other => debug!("Ignoring header field {other:?} in {path:?}"),
        }
    }

    let mut entries: Vec<LogEntry> = vec![];
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            let Some(entry) = entries.last_mut() else {
                return Err(parse_error(index, "entry body before any entry".into()));
            };
            entry.body.push(line.to_string());
            continue;
        }
        let entry = parse_entry(line, now).map_err(|message| parse_error(index, message))?;
        entries.push(entry);
    }

    Ok(project.with_entries(entries))
}

fn default_name(path: &Path) -> String {
    let stem = if path.file_name().is_some_and(|name| name == PROJECT_FILE_NAME) {
        path.parent().and_then(Path::file_name)
    } else {
        path.file_stem()
    };
    stem.map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Header lines stop at the first entry. Indented lines are entry bodies, never headers.
fn is_header_line(line: &str) -> bool {
    line.trim().is_empty() || !(is_entry_line(line) || line.starts_with(char::is_whitespace))
}

fn is_entry_line(line: &str) -> bool {
    line.get(..10)
        .is_some_and(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").is_ok())
}

fn split_tags(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1"
    )
}

fn parse_entry(line: &str, now: NaiveDateTime) -> Result<LogEntry, String> {
    let malformed = || format!("expected 'YYYY-MM-DD HH:MM-[HH:MM]', found {line:?}");

    let (day, span) = line.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("invalid date {day:?}: {e}"))?;
    let (begin, until) = span.trim().split_once('-').ok_or_else(malformed)?;

    let begin = day.and_time(parse_time(begin)?);
    let until = until.trim();
    if until.is_empty() {
        return Ok(LogEntry::open(begin, now));
    }

    let mut until = day.and_time(parse_time(until)?);
    if until < begin {
        until = until
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| format!("end time of {line:?} is out of range"))?;
    }
    Ok(LogEntry::closed(begin, until))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| format!("invalid time {value:?}: {e}"))
}
