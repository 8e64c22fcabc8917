use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::Config;

/// Guesses tags from project file paths using the `[autotag]` config table.
#[derive(Debug, Clone, Default)]
pub struct AutoTagger {
    rules: Vec<(String, Regex)>,
}

impl AutoTagger {
    pub fn new<'a>(patterns: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let rules = patterns
            .into_iter()
            .map(|(tag, pattern)| {
                Regex::new(pattern)
                    .map(|regex| (tag.to_string(), regex))
                    .with_context(|| format!("Invalid autotag pattern for {tag:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.autotag {
            Some(autotag) => Self::new(autotag.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            None => Ok(Self::default()),
        }
    }

    /// Tags whose pattern is found anywhere in `path`.
    pub fn tags_for(&self, path: &Path) -> BTreeSet<String> {
        let path = path.to_string_lossy();
        self.rules
            .iter()
            .filter(|(_, regex)| regex.is_match(&path))
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}
