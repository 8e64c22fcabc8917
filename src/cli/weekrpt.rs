use std::{fmt::Display, io::Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{project::Project, report::DEFAULT_WINDOW_DAYS, utils::percentage::Percentage};

use super::{output::ReportView, Args, Workspace};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct WeekrptCommand {
    #[arg(help = "Project filter: names, +tag or -tag. Put -tag tokens after --")]
    filter: Vec<String>,
    #[arg(
        long = "tag",
        help = "Only report projects carrying this tag. Can be repeated, all tags are required"
    )]
    tags: Vec<String>,
    #[arg(
        long = "project",
        help = "Report exactly these projects. Can be repeated, overrides --tag"
    )]
    projects: Vec<String>,
    #[arg(
        long = "end",
        help = "Last day of the report, today by default. Examples are \"yesterday\", \"last friday\", \"15/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        default_value_t = DEFAULT_WINDOW_DAYS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of days covered by the report"
    )]
    days: u32,
    #[arg(long = "min-share", help = "Hide projects below this share of the reported time from the breakdown", default_value_t = Percentage::ZERO)]
    min_share: Percentage,
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

/// Command to process `weekrpt` command. Prints the time spent on the selected projects over the
/// days leading to the end date.
pub fn process_weekrpt_command(
    workspace: &Workspace,
    WeekrptCommand {
        filter,
        tags,
        projects,
        end_date,
        date_style,
        days,
        min_share,
        json,
    }: WeekrptCommand,
) -> Result<()> {
    let until = parse_end_date(end_date.as_deref(), date_style, Local::now())?;

    let catalog = workspace.open_catalog(&filter)?;

    let selected = projects
        .iter()
        .map(|name| {
            catalog
                .project(name)
                .with_context(|| format!("No visible project named {name:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let explicit = selected
        .iter()
        .map(|project| project.as_ref())
        .collect::<Vec<&Project>>();

    let report = catalog.weekly_report(&tags, until, days, Some(explicit.as_slice()));

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        let view = ReportView {
            report: &report,
            min_share,
            styled: workspace.styled,
        };
        write!(stdout, "{view}")?;
    }
    Ok(())
}

fn parse_end_date(
    end_date: Option<&str>,
    date_style: DateStyle,
    now: DateTime<Local>,
) -> Result<Option<NaiveDate>> {
    let Some(end_date) = end_date else {
        return Ok(None);
    };
    match parse_date_string(end_date, now, date_style.into()) {
        Ok(v) => Ok(Some(v.date_naive())),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate end date {e}"),
            )
            .into()),
    }
}
