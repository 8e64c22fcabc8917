use std::{
    io::Write,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result};

use super::Project;

impl Project {
    /// Appends the project file to `archive`, keeping its location minus the root.
    pub fn backup<W: Write>(&self, archive: &mut tar::Builder<W>) -> Result<()> {
        archive
            .append_path_with_name(&self.path, archive_name(&self.path))
            .with_context(|| format!("Failed to back up project {} ({:?})", self.name, self.path))
    }
}

/// Archives only accept relative paths without parent references.
fn archive_name(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            Component::Prefix(_) | Component::RootDir | Component::CurDir | Component::ParentDir => None,
        })
        .collect()
}
