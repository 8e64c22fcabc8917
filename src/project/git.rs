//! Annotates log entries with the commits made while working on them.
//!
//! Commits show up in an entry body as ` - [git:<sha>] <summary>` lines. Collecting again stops at
//! the newest commit that is already listed, so lines removed by hand don't come back.

use std::{fs, path::Path, sync::LazyLock};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use git2::{Repository, Sort};
use regex::Regex;
use tracing::debug;

use super::{LogEntry, Project};

const DEFAULT_ABBREV: usize = 7;

static GIT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+- \[git:(?P<sha>[a-f0-9]{4,})\]\s+").unwrap());

/// Appends the commits authored by the configured `user.email` since `entry` began to its body,
/// oldest first. Returns the number of lines added. A directory without a repository adds nothing.
pub fn collect_commits(repo_dir: &Path, entry: &mut LogEntry) -> Result<usize> {
    if !repo_dir.join(".git").exists() {
        return Ok(0);
    }

    let seen = entry
        .body
        .iter()
        .filter_map(|line| GIT_LINE.captures(line))
        .filter_map(|captures| captures.name("sha"))
        .map(|sha| sha.as_str().to_string())
        .collect::<Vec<_>>();

    let repo = Repository::open(repo_dir)
        .with_context(|| format!("Failed to open git repository {}", repo_dir.display()))?;
    if repo.is_empty()? {
        return Ok(0);
    }
    let config = repo.config()?;
    let Ok(my_email) = config.get_string("user.email") else {
        debug!("No user.email configured for {repo_dir:?}");
        return Ok(0);
    };
    let abbrev = config
        .get_i32("core.abbrev")
        .ok()
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(DEFAULT_ABBREV)
        .max(4);
    let cutoff = local_timestamp(entry.begin);

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TIME)?;

    let mut lines = vec![];
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        let author = commit.author();
        if author.email() != Some(my_email.as_str()) {
            continue;
        }
        if author.when().seconds() < cutoff {
            break;
        }
        let sha = commit.id().to_string();
        if seen.iter().any(|known| sha.starts_with(known.as_str())) {
            break;
        }
        let short = sha.get(..abbrev).unwrap_or(&sha);
        lines.push(format!(
            " - [git:{short}] {}",
            commit.summary().unwrap_or_default()
        ));
    }

    lines.reverse();
    let added = lines.len();
    entry.body.extend(lines);
    Ok(added)
}

impl Project {
    /// Collects commits from the repository next to the project file into the latest entry.
    /// Returns the lines that were added.
    pub fn collect_commits(&mut self) -> Result<Vec<String>> {
        let (Some(dir), Some(entry)) = (self.path.parent(), self.log.entries.last_mut()) else {
            return Ok(vec![]);
        };
        let added = collect_commits(dir, entry)?;
        Ok(entry.body[entry.body.len() - added..].to_vec())
    }
}

/// Writes body lines of the latest entry to the end of a project file. The latest entry is always
/// the last one in the file.
pub fn append_body_lines(path: &Path, lines: &[String]) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut text = text.trim_end().to_string();
    for line in lines {
        text.push('\n');
        text.push_str(line);
    }
    text.push('\n');
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn local_timestamp(time: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map_or_else(|| time.and_utc().timestamp(), |v| v.timestamp())
}
