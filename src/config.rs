use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Tag name mapped to a regular expression tested against project file paths.
    pub autotag: Option<BTreeMap<String, String>>,
}

impl Config {
    /// Loads the config from `path`. A missing file means the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {path:?}, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::Config;

    #[test]
    fn test_parse_autotag_table() -> Result<()> {
        let config = Config::parse(
            r#"
            [autotag]
            work = "^/home/[^/]+/work/"
            rust = '\.rs/'
            "#,
        )?;
        let autotag = config.autotag.unwrap();
        assert_eq!(autotag.len(), 2);
        assert_eq!(autotag["work"], "^/home/[^/]+/work/");
        assert_eq!(autotag["rust"], r"\.rs/");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_default() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(Config::load(&dir.path().join("config.toml"))?, Config::default());
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_broken_file_is_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[autotag\n")?;
        assert!(Config::load(&path).is_err());
        Ok(())
    }
}
