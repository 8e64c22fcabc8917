//! Catalog of per-project work logs, with filtering by name and tag and reports of the time spent
//! over the last days.
//!

pub mod catalog;
pub mod cli;
pub mod config;
pub mod project;
pub mod report;
pub mod state;
pub mod utils;
