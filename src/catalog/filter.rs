use std::collections::HashSet;

use crate::project::Project;

/// One word of a project filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    /// `name`: only projects listed by name.
    Name(String),
    /// `+tag`: the project must carry one of the wanted tags.
    Wanted(String),
    /// `-tag`: the project must carry none of the unwanted tags.
    Unwanted(String),
}

impl From<&str> for FilterToken {
    fn from(value: &str) -> Self {
        if let Some(tag) = value.strip_prefix('+') {
            Self::Wanted(tag.to_string())
        } else if let Some(tag) = value.strip_prefix('-') {
            Self::Unwanted(tag.to_string())
        } else {
            Self::Name(value.to_string())
        }
    }
}

/// Selects projects by name and tags.
///
/// Listing names restricts the selection to exactly those projects. Tag rules are checked on top of
/// that: with any `+tag` given a project needs at least one of them, and any `-tag` it carries
/// rejects it. Contradicting tokens are not reconciled, `+a -a` simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    names: HashSet<String>,
    tags_wanted: HashSet<String>,
    tags_unwanted: HashSet<String>,
}

impl ProjectFilter {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_tokens(args.into_iter().map(|arg| FilterToken::from(arg.as_ref())))
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = FilterToken>) -> Self {
        let mut filter = Self::default();
        for token in tokens {
            match token {
                FilterToken::Name(name) => filter.names.insert(name),
                FilterToken::Wanted(tag) => filter.tags_wanted.insert(tag),
                FilterToken::Unwanted(tag) => filter.tags_unwanted.insert(tag),
            };
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.tags_wanted.is_empty() && self.tags_unwanted.is_empty()
    }

    pub fn matches(&self, project: &Project) -> bool {
        if !self.names.is_empty() && !self.names.contains(&project.name) {
            return false;
        }
        if !self.tags_wanted.is_empty() && !project.tags().any(|tag| self.tags_wanted.contains(tag)) {
            return false;
        }
        if project.tags().any(|tag| self.tags_unwanted.contains(tag)) {
            return false;
        }
        true
    }
}
