use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

const APPLICATION_NAME: &str = "worklog";

/// Directory holding the project index and the log files. Created if missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = base_dir("XDG_STATE_HOME", ".local/state")?;
    path.push(APPLICATION_NAME);

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v).with_context(|| format!("Failed to create {}", path.display())),
    }
}

/// Location of the configuration file. The file itself doesn't have to exist.
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = base_dir("XDG_CONFIG_HOME", ".config")?;
    path.push(APPLICATION_NAME);
    path.push("config.toml");
    Ok(path)
}

#[cfg(windows)]
fn base_dir(_xdg_var: &str, _home_relative: &str) -> Result<PathBuf> {
    env::var("APPDATA")
        .map(PathBuf::from)
        .context("APPDATA should be present on Windows")
}

#[cfg(not(windows))]
fn base_dir(xdg_var: &str, home_relative: &str) -> Result<PathBuf> {
    env::var(xdg_var)
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(home_relative)))
        .with_context(|| format!("Couldn't find neither {xdg_var} nor HOME"))
}
