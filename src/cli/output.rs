use std::fmt::{self, Display};

use ansi_term::Style;

use crate::{
    report::WeeklyReport,
    utils::percentage::{minutes_percentage, Percentage},
};

/// Text version of a report: totals, a per-project breakdown and the matching entries.
pub struct ReportView<'r, 'a> {
    pub report: &'r WeeklyReport<'a>,
    /// Projects below this share are left out of the breakdown.
    pub min_share: Percentage,
    pub styled: bool,
}

impl Display for ReportView<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let bold = |text: &str| paint(Style::new().bold(), text, self.styled);

        writeln!(f, "{}", bold(&format!("{} - {}", report.begin, report.until)))?;
        writeln!(
            f,
            "Entries: {}\tHours: {:.1}\tPer day: {:.1}\tPer workday: {:.1}",
            report.count, report.hours, report.hours_per_day, report.hours_per_workday
        )?;

        let whole = report.minutes();
        let totals = report.by_project();
        if !totals.is_empty() {
            writeln!(f)?;
            let width = totals.iter().map(|v| v.name.len()).max().unwrap_or(0);
            for total in totals {
                let share = minutes_percentage(total.minutes, whole);
                if share < self.min_share {
                    continue;
                }
                writeln!(
                    f,
                    "{:<width$}\t{}\t{:.1}%",
                    total.name,
                    format_duration(total.minutes),
                    *share
                )?;
            }
        }

        if !report.log.is_empty() {
            writeln!(f)?;
            for (entry, project) in &report.log {
                let until = entry
                    .until
                    .map(|v| v.format("%H:%M").to_string())
                    .unwrap_or_default();
                writeln!(
                    f,
                    "{}-{}\t{}\t{}",
                    entry.begin.format("%Y-%m-%d %H:%M"),
                    until,
                    format_duration(entry.duration),
                    bold(&project.name)
                )?;
            }
        }
        Ok(())
    }
}

fn paint(style: Style, text: &str, styled: bool) -> String {
    if styled {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

pub fn format_duration(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{}h{:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
