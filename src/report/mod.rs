//! Time spent on projects over a window of days.
//!
//! An entry counts towards the report when any of its days falls inside the window, its whole
//! duration is added even if it sticks out of it.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::{
    project::{LogEntry, Project},
    utils::time::{days_before, intervals_intersect},
};

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Workdays assumed in any window. Doesn't look at the actual calendar, so weekends and holidays
/// inside the window are not accounted for.
pub const WORKDAYS_PER_WEEK: f64 = 5.;

#[derive(Debug, Serialize)]
pub struct WeeklyReport<'a> {
    pub begin: NaiveDate,
    pub until: NaiveDate,
    pub count: usize,
    pub hours: f64,
    pub hours_per_day: f64,
    pub hours_per_workday: f64,
    /// Matching entries in the order projects were added, then in log order.
    #[serde(serialize_with = "serialize_log")]
    pub log: Vec<(&'a LogEntry, &'a Project)>,
}

/// Minutes reported for a single project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTotal<'a> {
    pub name: &'a str,
    pub minutes: i64,
}

impl<'a> WeeklyReport<'a> {
    pub fn minutes(&self) -> i64 {
        self.log.iter().map(|(entry, _)| entry.duration).sum()
    }

    /// Reported minutes per project, largest first.
    pub fn by_project(&self) -> Vec<ProjectTotal<'a>> {
        let mut map = HashMap::<&'a str, i64>::new();
        for &(entry, project) in &self.log {
            *map.entry(project.name.as_str()).or_default() += entry.duration;
        }

        let mut totals = map
            .into_iter()
            .map(|(name, minutes)| ProjectTotal { name, minutes })
            .collect::<Vec<_>>();
        totals.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.name.cmp(b.name)));
        totals
    }
}

/// Collects the projects a report is made of.
#[derive(Debug, Default)]
pub struct ReportBuilder<'a> {
    projects: Vec<&'a Project>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, project: &'a Project) {
        self.projects.push(project);
    }

    /// Builds the report for the `days` days leading to `until`. Entries that are still running
    /// are considered to last until `today`.
    pub fn build(&self, until: NaiveDate, days: u32, today: NaiveDate) -> WeeklyReport<'a> {
        let begin = days_before(until, days);

        let mut log = vec![];
        let mut minutes = 0i64;
        for &project in &self.projects {
            for entry in &project.log.entries {
                if intervals_intersect(entry.begin.date(), entry.end_date(today), begin, until) {
                    log.push((entry, project));
                    minutes += entry.duration;
                }
            }
        }

        let hours = minutes as f64 / 60.;
        WeeklyReport {
            begin,
            until,
            count: log.len(),
            hours,
            hours_per_day: hours / f64::from(days),
            hours_per_workday: hours / WORKDAYS_PER_WEEK,
            log,
        }
    }
}

impl<'a> Extend<&'a Project> for ReportBuilder<'a> {
    fn extend<T: IntoIterator<Item = &'a Project>>(&mut self, iter: T) {
        self.projects.extend(iter);
    }
}

#[derive(Serialize)]
struct LogLine<'a> {
    project: &'a str,
    begin: NaiveDateTime,
    until: Option<NaiveDateTime>,
    duration: i64,
}

fn serialize_log<S>(log: &[(&LogEntry, &Project)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(log.iter().map(|(entry, project)| LogLine {
        project: &project.name,
        begin: entry.begin,
        until: entry.until,
        duration: entry.duration,
    }))
}
