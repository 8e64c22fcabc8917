//! The state index remembers where project files live. It's a single JSON file in the state
//! directory, rebuilt by [StateIndex::rescan] and only read by everything else.

pub mod scan;

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const STATE_FILE_NAME: &str = "projects.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub fname: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateIndex {
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectRecord>,
}

impl StateIndex {
    pub fn insert(&mut self, name: impl Into<String>, fname: impl Into<PathBuf>) {
        self.projects.insert(
            name.into(),
            ProjectRecord {
                fname: fname.into(),
            },
        );
    }

    /// Reads the index from `state_dir`. An index that was never saved is empty.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(STATE_FILE_NAME);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state index at {path:?}");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to open {}", path.display())),
        };

        FileExt::lock_shared(&file)?;
        let result = serde_json::from_reader(BufReader::new(&file))
            .with_context(|| format!("Failed to parse state index {}", path.display()));
        FileExt::unlock(&file)?;
        result
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(STATE_FILE_NAME);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        // Truncate only once we own the lock, readers may still be on the old contents.
        FileExt::lock_exclusive(&file)?;
        let result = self
            .write_to(&file)
            .with_context(|| format!("Failed to write state index {}", path.display()));
        FileExt::unlock(&file)?;
        result
    }

    fn write_to(&self, mut file: &File) -> Result<()> {
        file.set_len(0)?;
        serde_json::to_writer_pretty(file, self)?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}
