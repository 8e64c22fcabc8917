pub mod output;
pub mod projects;
pub mod weekrpt;

use std::{io::IsTerminal, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, level_filters::LevelFilter};
use weekrpt::{process_weekrpt_command, WeekrptCommand};

use crate::{
    catalog::{autotag::AutoTagger, filter::ProjectFilter, Catalog},
    config::Config,
    project::FileProjectLoader,
    state::StateIndex,
    utils::{
        dir::{create_application_default_path, default_config_path},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "worklog", version, long_about = None)]
#[command(about = "Time reports over per-project work logs", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(long, global = true, help = "Include archived projects")]
    archived: bool,
    #[arg(
        long,
        global = true,
        help = "State directory. By default $XDG_STATE_HOME/worklog or $HOME/.local/state/worklog"
    )]
    statedir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Configuration file. By default $XDG_CONFIG_HOME/worklog/config.toml or $HOME/.config/worklog/config.toml"
    )]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "List projects with their tags")]
    List {
        #[arg(help = "Project filter: names, +tag or -tag. Put -tag tokens after --")]
        filter: Vec<String>,
    },
    #[command(about = "List all tags used by projects")]
    Tags {
        #[arg(help = "Project filter: names, +tag or -tag. Put -tag tokens after --")]
        filter: Vec<String>,
    },
    #[command(about = "Summarize time logged over the last days")]
    Weekrpt {
        #[command(flatten)]
        command: WeekrptCommand,
    },
    #[command(about = "Write a tar archive of all project files")]
    Backup {
        #[arg(long, short, help = "Archive path. Written to stdout when missing")]
        output: Option<PathBuf>,
    },
    #[command(about = "Add commits made since the latest entry began to its body")]
    Annotate {
        #[arg(help = "Project filter: names, +tag or -tag. Put -tag tokens after --")]
        filter: Vec<String>,
    },
    #[command(about = "Look for project files in the given directories and remember them")]
    Scan {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
}

/// Resolved locations and settings shared by all commands.
pub struct Workspace {
    pub state_dir: PathBuf,
    pub config: Config,
    pub show_archived: bool,
    /// Whether output can be colored.
    pub styled: bool,
}

impl Workspace {
    pub fn open_catalog<S: AsRef<str>>(&self, filter: &[S]) -> Result<Catalog> {
        let state = StateIndex::load(&self.state_dir)?;
        let autotag = AutoTagger::from_config(&self.config)?;
        Ok(Catalog::new(state, FileProjectLoader::default())
            .with_filter(ProjectFilter::new(filter))
            .with_autotag(autotag)
            .with_archived(self.show_archived))
    }
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let state_dir = match args.statedir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            dir
        }
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &state_dir.join("logs"), logging_level, args.log)?;

    let config_path = args.config.map_or_else(default_config_path, Ok)?;
    debug!("Using state {state_dir:?} and config {config_path:?}");
    let workspace = Workspace {
        state_dir,
        config: Config::load(&config_path)?,
        show_archived: args.archived,
        styled: std::io::stdout().is_terminal(),
    };

    match args.commands {
        Commands::List { filter } => projects::list_projects(&workspace, &filter),
        Commands::Tags { filter } => projects::list_tags(&workspace, &filter),
        Commands::Weekrpt { command } => process_weekrpt_command(&workspace, command),
        Commands::Backup { output } => projects::backup(&workspace, output),
        Commands::Annotate { filter } => projects::annotate(&workspace, &filter),
        Commands::Scan { dirs } => projects::scan(&workspace, &dirs),
    }
}
