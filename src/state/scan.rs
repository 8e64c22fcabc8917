use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::project::{
    parse::{PROJECT_EXTENSION, PROJECT_FILE_NAME},
    ProjectLoader,
};

use super::{ProjectRecord, StateIndex};

impl StateIndex {
    /// Looks for project files below `roots` and registers them under their project names.
    /// Records pointing to files that are gone get dropped. Returns the number of projects found.
    #[instrument(skip(self, loader))]
    pub fn rescan(&mut self, roots: &[PathBuf], loader: &impl ProjectLoader) -> Result<usize> {
        self.projects.retain(|name, record| {
            let present = loader.has_project(&record.fname);
            if !present {
                info!("Forgetting project {name}, {:?} is gone", record.fname);
            }
            present
        });

        let mut found = 0;
        for root in roots {
            let root = root
                .canonicalize()
                .with_context(|| format!("Can't scan {}", root.display()))?;
            for path in find_project_files(&root)? {
                let project = match loader.load(&path, None) {
                    Ok(project) => project,
                    Err(e) => {
                        warn!("Skipping {path:?}: {e}");
                        continue;
                    }
                };
                if let Some(previous) = self.projects.get(&project.name) {
                    if previous.fname != path {
                        warn!(
                            "Project {} at {path:?} replaces the one at {:?}",
                            project.name, previous.fname
                        );
                    }
                }
                self.projects.insert(project.name, ProjectRecord { fname: path });
                found += 1;
            }
        }
        Ok(found)
    }
}

/// Every project file below `root`, hidden directories excluded. Unreadable subdirectories are
/// skipped.
pub fn find_project_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = vec![];
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir != root => {
                warn!("Can't read {dir:?}: {e}");
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Can't read {}", dir.display())),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() && !is_hidden(&path) {
                pending.push(path);
            } else if file_type.is_file() && is_project_file(&path) {
                debug!("Found project file {path:?}");
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

pub fn is_project_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == PROJECT_FILE_NAME)
        || path.extension().is_some_and(|ext| ext == PROJECT_EXTENSION)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}
