use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use ansi_term::Style;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    project::{git::append_body_lines, FileProjectLoader},
    state::StateIndex,
};

use super::Workspace;

/// Prints visible projects, one per line, followed by their tags.
pub fn list_projects(workspace: &Workspace, filter: &[String]) -> Result<()> {
    let catalog = workspace.open_catalog(filter)?;
    let mut stdout = std::io::stdout().lock();
    for project in catalog.projects() {
        let name = if workspace.styled {
            Style::new().bold().paint(project.name.as_str()).to_string()
        } else {
            project.name.clone()
        };
        let tags = project.tags().collect::<Vec<_>>().join(" ");
        writeln!(stdout, "{name}\t{tags}")?;
    }
    Ok(())
}

pub fn list_tags(workspace: &Workspace, filter: &[String]) -> Result<()> {
    let catalog = workspace.open_catalog(filter)?;
    let mut stdout = std::io::stdout().lock();
    for tag in catalog.all_tags() {
        writeln!(stdout, "{tag}")?;
    }
    Ok(())
}

/// Archives every visible project file into `output`, or stdout when missing.
pub fn backup(workspace: &Workspace, output: Option<PathBuf>) -> Result<()> {
    let catalog = workspace.open_catalog::<&str>(&[])?;
    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            catalog.backup(BufWriter::new(file))?.flush()?;
            info!("Wrote backup to {path:?}");
        }
        None => {
            catalog.backup(std::io::stdout().lock())?.flush()?;
        }
    }
    Ok(())
}

/// Writes recent commits into the latest entry of every visible project kept in a git repository.
pub fn annotate(workspace: &Workspace, filter: &[String]) -> Result<()> {
    let catalog = workspace.open_catalog(filter)?;
    for project in catalog.projects() {
        let mut project = project.clone();
        let lines = match project.collect_commits() {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Can't collect commits for {}: {e:#}", project.name);
                continue;
            }
        };
        if lines.is_empty() {
            continue;
        }
        append_body_lines(&project.path, &lines)?;
        println!("{}\t{} commits", project.name, lines.len());
    }
    Ok(())
}

pub fn scan(workspace: &Workspace, dirs: &[PathBuf]) -> Result<()> {
    let mut state = StateIndex::load(&workspace.state_dir)?;
    let found = state.rescan(dirs, &FileProjectLoader::default())?;
    state.save(&workspace.state_dir)?;
    println!(
        "Found {found} project files, {} projects known",
        state.projects.len()
    );
    Ok(())
}
