//! Name → id resolution for projects, sections and labels.
//!
//! Each kind is listed once per request and kept in a [`NameCache`]; misses
//! are created on the service and added to the cache. Two requests running
//! at the same time can both miss the same name and both create it; nothing
//! here coordinates across requests.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::integrations::TaskApi;

/// Prefix of the placeholder ids handed out for misses during a dry run.
pub const DRY_RUN_ID_PREFIX: &str = "dry-run:";

/// Exact, case-sensitive name → id map.
#[derive(Debug, Clone, Default)]
pub struct NameCache {
    ids: HashMap<String, String>,
}

impl NameCache {
    /// Build from a listing. When a name occurs more than once the first
    /// entry wins.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut ids = HashMap::new();
        for (name, id) in entries {
            ids.entry(name).or_insert(id);
        }
        Self { ids }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: String, id: String) {
        self.ids.insert(name, id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Per-request resolver with create-on-miss.
pub struct Resolver<'a, A: TaskApi + ?Sized> {
    api: &'a A,
    dry_run: bool,
    projects: NameCache,
    labels: NameCache,
    /// Keyed by project id, filled lazily.
    sections: HashMap<String, NameCache>,
}

impl<'a, A: TaskApi + ?Sized> Resolver<'a, A> {
    /// List projects and labels once. In dry-run mode misses get placeholder
    /// ids instead of being created.
    pub async fn load(api: &'a A, dry_run: bool) -> Result<Resolver<'a, A>, ApiError> {
        let projects = api.list_projects().await?;
        let labels = api.list_labels().await?;
        tracing::debug!(
            service = api.name(),
            projects = projects.len(),
            labels = labels.len(),
            "loaded name caches"
        );
        Ok(Self {
            api,
            dry_run,
            projects: NameCache::from_entries(projects.into_iter().map(|p| (p.name, p.id))),
            labels: NameCache::from_entries(labels.into_iter().map(|l| (l.name, l.id))),
            sections: HashMap::new(),
        })
    }

    fn placeholder(name: &str) -> String {
        format!("{DRY_RUN_ID_PREFIX}{name}")
    }

    /// Id of the named project, creating it if needed.
    pub async fn project_id(&mut self, name: &str) -> Result<String, ApiError> {
        if let Some(id) = self.projects.get(name) {
            return Ok(id.to_string());
        }
        let id = if self.dry_run {
            Self::placeholder(name)
        } else {
            let project = self.api.create_project(name).await?;
            tracing::info!(name, id = %project.id, "created project");
            project.id
        };
        self.projects.insert(name.to_string(), id.clone());
        Ok(id)
    }

    /// Name to put on a task for the named label, creating the label if
    /// needed. Tasks reference labels by name.
    pub async fn label(&mut self, name: &str) -> Result<String, ApiError> {
        if self.labels.get(name).is_some() {
            return Ok(name.to_string());
        }
        let id = if self.dry_run {
            Self::placeholder(name)
        } else {
            let label = self.api.create_label(name).await?;
            tracing::info!(name, id = %label.id, "created label");
            label.id
        };
        self.labels.insert(name.to_string(), id);
        Ok(name.to_string())
    }

    /// Id of the named section inside `project_id`, creating it if needed.
    pub async fn section_id(&mut self, project_id: &str, name: &str) -> Result<String, ApiError> {
        if !self.sections.contains_key(project_id) {
            let cache = if project_id.starts_with(DRY_RUN_ID_PREFIX) {
                NameCache::default()
            } else {
                let sections = self.api.list_sections(project_id).await?;
                NameCache::from_entries(sections.into_iter().map(|s| (s.name, s.id)))
            };
            self.sections.insert(project_id.to_string(), cache);
        }
        if let Some(id) = self.sections.get(project_id).and_then(|c| c.get(name)) {
            return Ok(id.to_string());
        }

        let id = if self.dry_run {
            Self::placeholder(name)
        } else {
            let section = self.api.create_section(project_id, name).await?;
            tracing::info!(name, project_id, id = %section.id, "created section");
            section.id
        };
        self.sections
            .entry(project_id.to_string())
            .or_default()
            .insert(name.to_string(), id.clone());
        Ok(id)
    }
}
