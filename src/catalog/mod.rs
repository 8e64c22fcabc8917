//! The catalog turns the state index into loaded [Project]s.
//!
//! Projects are loaded at most once per catalog: the first call needing the whole set fills the
//! cache and later changes to the index or the files are not picked up. Looking up a single
//! project before that loads just that one and leaves the cache alone.

pub mod autotag;
pub mod filter;

use std::{
    borrow::Cow,
    cell::OnceCell,
    collections::{BTreeSet, HashMap},
    io::{Read, Write},
    path::Path,
};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::{
    project::{FileProjectLoader, Project, ProjectLoader},
    report::{ReportBuilder, WeeklyReport},
    state::StateIndex,
    utils::clock::{Clock, DefaultClock},
};

use autotag::AutoTagger;
use filter::ProjectFilter;

pub struct Catalog<L = FileProjectLoader> {
    state: StateIndex,
    loader: L,
    filter: ProjectFilter,
    autotag: AutoTagger,
    show_archived: bool,
    clock: Box<dyn Clock>,
    projects: OnceCell<HashMap<String, Project>>,
}

impl<L: ProjectLoader> Catalog<L> {
    pub fn new(state: StateIndex, loader: L) -> Self {
        Self {
            state,
            loader,
            filter: ProjectFilter::default(),
            autotag: AutoTagger::default(),
            show_archived: false,
            clock: Box::new(DefaultClock),
            projects: OnceCell::new(),
        }
    }

    pub fn with_filter(self, filter: ProjectFilter) -> Self {
        Self { filter, ..self }
    }

    pub fn with_autotag(self, autotag: AutoTagger) -> Self {
        Self { autotag, ..self }
    }

    /// Whether archived projects are loaded as well.
    pub fn with_archived(self, show_archived: bool) -> Self {
        Self {
            show_archived,
            ..self
        }
    }

    pub fn with_clock(self, clock: impl Clock) -> Self {
        Self {
            clock: Box::new(clock),
            ..self
        }
    }

    pub fn state(&self) -> &StateIndex {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateIndex {
        &mut self.state
    }

    /// Loads the project stored at `fname`. Gives nothing back when the file is gone or broken,
    /// when the project is archived and archived projects are hidden, or when it doesn't pass the
    /// filter.
    pub fn load_project(&self, fname: &Path, source: Option<&mut dyn Read>) -> Option<Project> {
        if !self.loader.has_project(fname) {
            warn!("project {fname:?} has disappeared: please rerun scan");
            return None;
        }
        let mut project = match self.loader.load(fname, source) {
            Ok(project) => project,
            Err(e) => {
                warn!("Skipping project {fname:?}: {e}");
                return None;
            }
        };
        if project.archived && !self.show_archived {
            debug!("Hiding archived project {}", project.name);
            return None;
        }
        project.default_tags.extend(self.autotag.tags_for(fname));
        if !self.filter.matches(&project) {
            return None;
        }
        Some(project)
    }

    #[instrument(skip(self))]
    fn load_projects(&self) -> HashMap<String, Project> {
        let mut projects = HashMap::new();
        for record in self.state.projects.values() {
            let Some(project) = self.load_project(&record.fname, None) else {
                continue;
            };
            projects.insert(project.name.clone(), project);
        }
        debug!("Loaded {} projects", projects.len());
        projects
    }

    /// Every visible project by name.
    pub fn all_projects(&self) -> &HashMap<String, Project> {
        self.projects.get_or_init(|| self.load_projects())
    }

    /// Every visible project, sorted by name.
    pub fn projects(&self) -> Vec<&Project> {
        let mut projects = self.all_projects().values().collect::<Vec<_>>();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    /// Tags of all visible projects, sorted.
    pub fn all_tags(&self) -> Vec<&str> {
        self.all_projects()
            .values()
            .flat_map(|project| project.tags())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn project(&self, name: &str) -> Option<Cow<'_, Project>> {
        self.project_from(name, None)
    }

    /// Like [Catalog::project], reading the project contents from `source` if it has to be loaded.
    pub fn project_from(
        &self,
        name: &str,
        source: Option<&mut dyn Read>,
    ) -> Option<Cow<'_, Project>> {
        if let Some(projects) = self.projects.get() {
            return projects.get(name).map(Cow::Borrowed);
        }

        let record = self.state.projects.get(name)?;
        self.load_project(&record.fname, source).map(Cow::Owned)
    }

    /// Report over the `days` days up to `until` (today by default).
    ///
    /// A non-empty `explicit` list is reported as is. Otherwise every project carrying all of
    /// `required_tags` is included.
    pub fn weekly_report<'a, S: AsRef<str>>(
        &'a self,
        required_tags: &[S],
        until: Option<NaiveDate>,
        days: u32,
        explicit: Option<&[&'a Project]>,
    ) -> WeeklyReport<'a> {
        let mut builder = ReportBuilder::new();
        match explicit {
            Some(projects) if !projects.is_empty() => builder.extend(projects.iter().copied()),
            _ => builder.extend(
                self.projects()
                    .into_iter()
                    .filter(|project| required_tags.iter().all(|tag| project.has_tag(tag.as_ref()))),
            ),
        }

        let today = self.clock.today();
        builder.build(until.unwrap_or(today), days, today)
    }

    /// Writes a tar archive with every visible project file into `out`.
    pub fn backup<W: Write>(&self, out: W) -> Result<W> {
        let mut archive = tar::Builder::new(out);
        for project in self.projects() {
            project.backup(&mut archive)?;
        }
        Ok(archive.into_inner()?)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        collections::HashMap,
        io::Read,
        path::{Path, PathBuf},
    };

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::tempdir;

    use crate::{
        project::{FileProjectLoader, LogEntry, Project, ProjectError, ProjectLoader},
        state::StateIndex,
        utils::{clock::MockClock, logging::TEST_LOGGING},
    };

    use super::{autotag::AutoTagger, filter::ProjectFilter, Catalog};

    #[derive(Default)]
    struct MemoryLoader {
        projects: HashMap<PathBuf, Project>,
        loads: Cell<usize>,
    }

    impl MemoryLoader {
        fn with(mut self, project: Project) -> Self {
            self.projects.insert(project.path.clone(), project);
            self
        }
    }

    impl ProjectLoader for MemoryLoader {
        fn has_project(&self, path: &Path) -> bool {
            self.projects.contains_key(path)
        }

        fn load(&self, path: &Path, _source: Option<&mut dyn Read>) -> Result<Project, ProjectError> {
            self.loads.set(self.loads.get() + 1);
            self.projects
                .get(path)
                .cloned()
                .ok_or_else(|| ProjectError::NotFound(path.to_owned()))
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> NaiveDateTime {
        day(d).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn project(name: &str, tags: &[&str]) -> Project {
        Project::new(name, format!("/work/{name}.worklog")).with_tags(tags.iter().copied())
    }

    fn index(names: &[&str]) -> StateIndex {
        let mut state = StateIndex::default();
        for name in names {
            state.insert(*name, format!("/work/{name}.worklog"));
        }
        state
    }

    fn sample_catalog() -> Catalog<MemoryLoader> {
        let loader = MemoryLoader::default()
            .with(project("alpha", &["client", "urgent"]))
            .with(project("beta", &["home"]))
            .with(project("gamma", &["client"]).with_archived(true));
        Catalog::new(index(&["alpha", "beta", "gamma", "missing"]), loader)
    }

    fn names<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Vec<&'a str> {
        projects.into_iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_projects_are_loaded_once() {
        *TEST_LOGGING;
        let mut catalog = sample_catalog();

        let first: *const _ = catalog.all_projects();
        // The archived one is read too, only to be hidden.
        assert_eq!(catalog.loader.loads.get(), 3);

        catalog.state_mut().insert("delta", "/work/delta.worklog");
        let second: *const _ = catalog.all_projects();

        assert!(std::ptr::eq(first, second));
        assert_eq!(catalog.all_projects().len(), 2);
        assert_eq!(catalog.loader.loads.get(), 3);
    }

    #[test]
    fn test_missing_and_archived_are_hidden() {
        let catalog = sample_catalog();
        assert_eq!(names(catalog.projects()), vec!["alpha", "beta"]);

        let catalog = sample_catalog().with_archived(true);
        assert_eq!(names(catalog.projects()), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_filter_is_applied() {
        let catalog = sample_catalog().with_filter(ProjectFilter::new(["+client"]));
        assert_eq!(names(catalog.projects()), vec!["alpha"]);

        let catalog = sample_catalog().with_filter(ProjectFilter::new(["beta"]));
        assert_eq!(names(catalog.projects()), vec!["beta"]);
        assert!(catalog.project("alpha").is_none());
    }

    #[test]
    fn test_autotags_are_merged_before_filtering() -> Result<()> {
        let catalog = sample_catalog()
            .with_autotag(AutoTagger::new([("b-side", "/beta"), ("any", "worklog$")])?)
            .with_filter(ProjectFilter::new(["+b-side"]));

        let projects = catalog.projects();
        assert_eq!(names(projects.iter().copied()), vec!["beta"]);
        assert_eq!(projects[0].tags().collect::<Vec<_>>(), vec!["home", "any", "b-side"]);
        Ok(())
    }

    #[test]
    fn test_projects_keyed_by_their_own_name() {
        let loader = MemoryLoader::default()
            .with(Project::new("same", "/work/a.worklog"))
            .with(Project::new("same", "/work/b.worklog"));
        let mut state = StateIndex::default();
        state.insert("a", "/work/a.worklog");
        state.insert("b", "/work/b.worklog");
        let catalog = Catalog::new(state, loader);

        let projects = catalog.all_projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects["same"].path, PathBuf::from("/work/b.worklog"));
    }

    #[test]
    fn test_all_tags_sorted_and_unique() {
        let catalog = sample_catalog().with_archived(true);
        assert_eq!(catalog.all_tags(), vec!["client", "home", "urgent"]);
    }

    #[test]
    fn test_single_lookup_does_not_fill_cache() {
        let catalog = sample_catalog();

        let alpha = catalog.project("alpha").unwrap();
        assert_eq!(alpha.name, "alpha");
        assert!(matches!(alpha, std::borrow::Cow::Owned(_)));
        assert!(catalog.projects.get().is_none());

        catalog.project("alpha").unwrap();
        assert_eq!(catalog.loader.loads.get(), 2);

        assert!(catalog.project("gamma").is_none());
        assert!(catalog.project("missing").is_none());
        assert!(catalog.project("unknown").is_none());
    }

    #[test]
    fn test_single_lookup_uses_filled_cache() {
        let catalog = sample_catalog();
        catalog.all_projects();
        let loads = catalog.loader.loads.get();

        let beta = catalog.project("beta").unwrap();
        assert!(matches!(beta, std::borrow::Cow::Borrowed(_)));
        assert_eq!(catalog.loader.loads.get(), loads);
    }

    fn report_catalog() -> Catalog<MemoryLoader> {
        let loader = MemoryLoader::default()
            .with(
                project("alpha", &["client", "urgent"])
                    .with_entries(vec![LogEntry::closed(at(6, 9), at(6, 16))]),
            )
            .with(
                project("beta", &["client"])
                    .with_entries(vec![LogEntry::closed(at(7, 9), at(7, 10))]),
            )
            .with(
                project("delta", &["home"])
                    .with_entries(vec![LogEntry::open(at(9, 9), at(10, 9))]),
            );
        let mut clock = MockClock::new();
        clock.expect_today().return_const(day(10));
        Catalog::new(index(&["alpha", "beta", "delta"]), loader).with_clock(clock)
    }

    #[test]
    fn test_report_over_all_projects() {
        let catalog = report_catalog();

        let report = catalog.weekly_report::<&str>(&[], None, 7, None);

        assert_eq!(report.until, day(10));
        assert_eq!(report.begin, day(3));
        assert_eq!(report.count, 3);
        assert_eq!(report.hours, (420. + 60. + 1440.) / 60.);
        assert_eq!(names(report.log.iter().map(|(_, p)| *p)), vec!["alpha", "beta", "delta"]);
    }

    #[test]
    fn test_report_by_required_tags() {
        let catalog = report_catalog();

        let report = catalog.weekly_report(&["client"], None, 7, None);
        assert_eq!(report.count, 2);

        let report = catalog.weekly_report(&["client", "urgent"], Some(day(8)), 7, None);
        assert_eq!(report.until, day(8));
        assert_eq!(names(report.log.iter().map(|(_, p)| *p)), vec!["alpha"]);
    }

    #[test]
    fn test_explicit_projects_ignore_tags() {
        let catalog = report_catalog();
        let delta = catalog.project("delta").unwrap();

        let report = catalog.weekly_report(&["client"], None, 7, Some([delta.as_ref()].as_slice()));
        assert_eq!(names(report.log.iter().map(|(_, p)| *p)), vec!["delta"]);

        let report = catalog.weekly_report(&["client"], None, 7, Some(&[][..]));
        assert_eq!(report.count, 2);
    }

    #[test]
    fn test_backup_archives_visible_projects() -> Result<()> {
        let dir = tempdir()?;
        let mut state = StateIndex::default();
        for (name, text) in [
            ("alpha", "Name: alpha\n"),
            ("beta", "Name: beta\nArchived: yes\n"),
            ("gamma", "Name: gamma\n"),
        ] {
            let path = dir.path().join(format!("{name}.worklog"));
            std::fs::write(&path, text)?;
            state.insert(name, path);
        }
        let catalog = Catalog::new(state, FileProjectLoader::default());

        let bytes = catalog.backup(Vec::new())?;

        let mut archive = tar::Archive::new(bytes.as_slice());
        let mut stored = vec![];
        for entry in archive.entries()? {
            let entry = entry?;
            let path = entry.path()?.into_owned();
            stored.push(path.file_name().unwrap().to_string_lossy().to_string());
        }
        assert_eq!(stored, vec!["alpha.worklog", "gamma.worklog"]);
        Ok(())
    }
}
