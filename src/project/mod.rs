//! Projects and their logs. A project lives in its own text file, see [parse] for the layout.
//! The rest of the crate only talks to project files through [ProjectLoader].

pub mod backup;
pub mod git;
pub mod parse;

use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::utils::clock::{Clock, DefaultClock};

/// One recorded span of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub begin: NaiveDateTime,
    /// `None` while the entry is still running.
    pub until: Option<NaiveDateTime>,
    /// Minutes worked. Open entries are measured up to the moment they were loaded.
    pub duration: i64,
    pub body: Vec<String>,
}

impl LogEntry {
    pub fn closed(begin: NaiveDateTime, until: NaiveDateTime) -> Self {
        Self {
            begin,
            until: Some(until),
            duration: (until - begin).num_minutes(),
            body: vec![],
        }
    }

    pub fn open(begin: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            begin,
            until: None,
            duration: (now - begin).num_minutes().max(0),
            body: vec![],
        }
    }

    pub fn with_duration(self, duration: i64) -> Self {
        Self { duration, ..self }
    }

    pub fn is_open(&self) -> bool {
        self.until.is_none()
    }

    /// Last day touched by the entry. Open entries reach up to `today`.
    pub fn end_date(&self, today: NaiveDate) -> NaiveDate {
        self.until.map_or(today, |until| until.date())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Log {
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    /// Tags written in the project file.
    pub declared_tags: BTreeSet<String>,
    /// Tags attached from the outside, e.g. by autotagging.
    pub default_tags: BTreeSet<String>,
    pub archived: bool,
    pub log: Log,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            declared_tags: BTreeSet::new(),
            default_tags: BTreeSet::new(),
            archived: false,
            log: Log::default(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_entries(mut self, entries: Vec<LogEntry>) -> Self {
        self.log.entries = entries;
        self
    }

    pub fn with_archived(self, archived: bool) -> Self {
        Self { archived, ..self }
    }

    /// Declared and default tags together, without duplicates.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.declared_tags
            .iter()
            .chain(
                self.default_tags
                    .iter()
                    .filter(|tag| !self.declared_tags.contains(*tag)),
            )
            .map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.declared_tags.contains(tag) || self.default_tags.contains(tag)
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Access to project files.
pub trait ProjectLoader {
    /// Whether `path` still points to something that can be loaded.
    fn has_project(&self, path: &Path) -> bool;

    /// Loads the project stored at `path`. When `source` is given the contents are read from it
    /// instead of opening the file again.
    fn load(&self, path: &Path, source: Option<&mut dyn Read>) -> Result<Project, ProjectError>;
}

/// The main realization of [ProjectLoader], reading the text format from disk.
pub struct FileProjectLoader {
    clock: Box<dyn Clock>,
}

impl FileProjectLoader {
    pub fn new(clock: impl Clock) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }
}

impl Default for FileProjectLoader {
    fn default() -> Self {
        Self::new(DefaultClock)
    }
}

impl ProjectLoader for FileProjectLoader {
    fn has_project(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path, source: Option<&mut dyn Read>) -> Result<Project, ProjectError> {
        debug!("Loading project {path:?}");
        let io_error = |source: io::Error| {
            if source.kind() == io::ErrorKind::NotFound {
                ProjectError::NotFound(path.to_owned())
            } else {
                ProjectError::Io {
                    path: path.to_owned(),
                    source,
                }
            }
        };

        let mut text = String::new();
        let read = match source {
            Some(reader) => reader.read_to_string(&mut text),
            None => File::open(path).and_then(|mut file| file.read_to_string(&mut text)),
        };
        read.map_err(io_error)?;

        parse::parse_project(path, &text, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::tempdir;

    use crate::utils::clock::MockClock;

    use super::{FileProjectLoader, LogEntry, Project, ProjectError, ProjectLoader};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn fixed_loader(now: NaiveDateTime) -> FileProjectLoader {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(now);
        FileProjectLoader::new(clock)
    }

    #[test]
    fn test_tags_merge_declared_and_default() {
        let mut project = Project::new("alpha", "/tmp/alpha.worklog").with_tags(["client", "urgent"]);
        project.default_tags.extend(["urgent".to_string(), "work".to_string()]);

        let tags = project.tags().collect::<Vec<_>>();
        assert_eq!(tags, vec!["client", "urgent", "work"]);
        assert!(project.has_tag("work"));
        assert!(!project.has_tag("home"));
    }

    #[test]
    fn test_open_entry_end_date() {
        let entry = LogEntry::open(at(3, 9, 0), at(3, 10, 30));
        assert_eq!(entry.duration, 90);
        assert!(entry.is_open());
        assert_eq!(
            entry.end_date(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
        );

        let entry = LogEntry::open(at(3, 9, 0), at(3, 8, 0));
        assert_eq!(entry.duration, 0);
    }

    #[test]
    fn test_load_from_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("alpha.worklog");
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "Tags: client\n\n2025-03-03 09:00-12:00\n2025-03-04 13:00-")?;

        let loader = fixed_loader(at(4, 14, 0));
        assert!(loader.has_project(&path));
        let project = loader.load(&path, None)?;

        assert_eq!(project.name, "alpha");
        assert_eq!(project.log.entries.len(), 2);
        assert_eq!(project.log.entries[0].duration, 180);
        assert_eq!(project.log.entries[1].duration, 60);
        Ok(())
    }

    #[test]
    fn test_load_prefers_given_source() -> Result<()> {
        let loader = fixed_loader(at(4, 14, 0));
        let mut source = "Name: beta\n\n2025-03-03 09:00-09:30\n".as_bytes();

        let project = loader.load("/nowhere/beta.worklog".as_ref(), Some(&mut source))?;

        assert_eq!(project.name, "beta");
        assert_eq!(project.log.entries[0].duration, 30);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("gone.worklog");
        let loader = fixed_loader(at(4, 14, 0));

        assert!(!loader.has_project(&path));
        assert!(matches!(
            loader.load(&path, None),
            Err(ProjectError::NotFound(p)) if p == path
        ));
        Ok(())
    }
}
