//! Task query: fetch by project, then filter by label and due range in memory.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, Result, ValidationError};
use crate::import::NameCache;
use crate::integrations::TaskApi;
use crate::task::TaskRecord;
use crate::time;

/// Accepts either `"Timetable"` or `["Timetable", "Homework"]`.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskQuery {
    #[serde(alias = "project_name", deserialize_with = "one_or_many")]
    pub project_names: Vec<String>,
    #[serde(alias = "label", deserialize_with = "one_or_many")]
    pub labels: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<usize>,
    /// Zone for date bounds and floating dues; config default otherwise.
    pub timezone: Option<String>,
}

/// Projection of a task returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub content: String,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub section_id: Option<String>,
    pub labels: Vec<String>,
    pub priority: u8,
    pub due_string: Option<String>,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub duration_minutes: Option<i64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub tasks: Vec<TaskView>,
}

/// Tasks fetched for a read request, plus project names by id.
#[derive(Debug, Default)]
pub struct FetchedTasks {
    pub tasks: Vec<TaskRecord>,
    pub project_names: HashMap<String, String>,
}

/// Fetch tasks in the named projects, or all tasks when `project_names` is
/// empty. Unknown names are skipped; the read path never creates projects.
pub async fn fetch_tasks<A: TaskApi + ?Sized>(
    api: &A,
    project_names: &[String],
) -> std::result::Result<FetchedTasks, ApiError> {
    let projects = api.list_projects().await?;
    let by_name = NameCache::from_entries(projects.iter().map(|p| (p.name.clone(), p.id.clone())));
    let names_by_id: HashMap<String, String> = projects
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let mut tasks = Vec::new();
    if project_names.is_empty() {
        tasks = api.list_tasks(None).await?;
    } else {
        let mut seen: Vec<&str> = Vec::new();
        for name in project_names.iter().map(String::as_str) {
            if name.trim().is_empty() || seen.contains(&name) {
                continue;
            }
            seen.push(name);
            match by_name.get(name) {
                Some(id) => tasks.extend(api.list_tasks(Some(id)).await?),
                None => tracing::warn!(project = name, "unknown project in query, skipping"),
            }
        }
    }

    tracing::debug!(service = api.name(), tasks = tasks.len(), "fetched tasks");
    Ok(FetchedTasks {
        tasks,
        project_names: names_by_id,
    })
}

/// In-memory filter built from a [`TaskQuery`].
#[derive(Debug, Clone)]
pub struct TaskFilter {
    labels: Vec<String>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: Option<usize>,
    timezone: Tz,
}

impl TaskFilter {
    pub fn from_query(query: &TaskQuery, default_tz: Tz) -> Result<Self, ValidationError> {
        let timezone = match query.timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => time::parse_timezone("timezone", name)?,
            _ => default_tz,
        };
        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if from > to {
                return Err(ValidationError::InvalidRange {
                    start_field: "date_from".into(),
                    start: from.to_string(),
                    end_field: "date_to".into(),
                    end: to.to_string(),
                });
            }
        }
        Ok(Self {
            labels: query
                .labels
                .iter()
                .filter(|l| !l.trim().is_empty())
                .cloned()
                .collect(),
            from: query.date_from.map(|d| time::day_bounds(timezone, d).0),
            until: query.date_to.map(|d| time::day_bounds(timezone, d).1),
            limit: query.limit,
            timezone,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn has_range(&self) -> bool {
        self.from.is_some() || self.until.is_some()
    }

    /// Label and due-range test. Tasks without a resolvable due never match
    /// a range but pass when no range is set.
    pub fn matches(&self, task: &TaskRecord) -> bool {
        if !self.labels.is_empty() && !task.labels.iter().any(|l| self.labels.contains(l)) {
            return false;
        }
        if !self.has_range() {
            return true;
        }
        let Some(due) = task.due_at(self.timezone) else {
            return false;
        };
        self.from.map_or(true, |from| due >= from) && self.until.map_or(true, |until| due < until)
    }

    /// Filter, then truncate to the limit.
    pub fn apply(&self, tasks: Vec<TaskRecord>) -> Vec<TaskRecord> {
        let matching = tasks.into_iter().filter(|t| self.matches(t));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

fn view(task: TaskRecord, project_names: &HashMap<String, String>, tz: Tz) -> TaskView {
    let due_at = task.due_at(tz).map(|dt| time::in_zone(dt, tz));
    TaskView {
        project_name: task
            .project_id
            .as_ref()
            .and_then(|id| project_names.get(id))
            .cloned(),
        due_string: task.due.as_ref().and_then(|d| d.string.clone()),
        duration_minutes: task.duration.map(|d| d.in_minutes()),
        due_at,
        id: task.id,
        content: task.content,
        project_id: task.project_id,
        section_id: task.section_id,
        labels: task.labels,
        priority: task.priority,
        url: task.url,
    }
}

/// Run a task query.
pub async fn run_query<A: TaskApi + ?Sized>(
    api: &A,
    query: &TaskQuery,
    default_tz: Tz,
) -> Result<QueryResponse> {
    let filter = TaskFilter::from_query(query, default_tz)?;
    let fetched = fetch_tasks(api, &query.project_names).await?;
    let tz = filter.timezone();
    let tasks = filter
        .apply(fetched.tasks)
        .into_iter()
        .map(|t| view(t, &fetched.project_names, tz))
        .collect();
    Ok(QueryResponse { tasks })
}
