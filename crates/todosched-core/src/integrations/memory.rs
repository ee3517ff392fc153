//! In-process `TaskApi` backed by plain vectors.
//!
//! Records every call it receives so callers can check which requests a
//! flow issued. Failures can be injected per task title or for all deletes.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::traits::TaskApi;
use crate::error::ApiError;
use crate::task::{
    Due, DurationUnit, Label, NewTask, Project, Section, TaskDuration, TaskRecord, TaskUpdate,
};

/// One request received by [`MemoryTaskApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListProjects,
    CreateProject(String),
    ListLabels,
    CreateLabel(String),
    ListSections(String),
    CreateSection { project_id: String, name: String },
    ListTasks(Option<String>),
    CreateTask(String),
    UpdateTask(String),
    DeleteTask(String),
}

impl ApiCall {
    /// Whether the call changes state on the service.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            ApiCall::ListProjects
                | ApiCall::ListLabels
                | ApiCall::ListSections(_)
                | ApiCall::ListTasks(_)
        )
    }
}

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    labels: Vec<Label>,
    sections: Vec<Section>,
    tasks: Vec<TaskRecord>,
    calls: Vec<ApiCall>,
    failing_contents: HashSet<String>,
    fail_deletes: bool,
}

#[derive(Default)]
pub struct MemoryTaskApi {
    state: Mutex<State>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn injected(endpoint: &str) -> ApiError {
    ApiError::Status {
        status: 503,
        endpoint: endpoint.to_string(),
        body: "injected failure".to_string(),
    }
}

impl MemoryTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a project without recording a call.
    pub fn add_project(&self, name: &str) -> Project {
        let project = Project {
            id: new_id(),
            name: name.to_string(),
        };
        self.lock().projects.push(project.clone());
        project
    }

    /// Seed a label without recording a call.
    pub fn add_label(&self, name: &str) -> Label {
        let label = Label {
            id: new_id(),
            name: name.to_string(),
        };
        self.lock().labels.push(label.clone());
        label
    }

    /// Seed a section without recording a call.
    pub fn add_section(&self, project_id: &str, name: &str) -> Section {
        let section = Section {
            id: new_id(),
            project_id: project_id.to_string(),
            name: name.to_string(),
        };
        self.lock().sections.push(section.clone());
        section
    }

    /// Seed a task without recording a call.
    pub fn add_task(&self, task: TaskRecord) {
        self.lock().tasks.push(task);
    }

    /// Make `create_task` fail for tasks with exactly this content.
    pub fn fail_create_for(&self, content: &str) {
        self.lock().failing_contents.insert(content.to_string());
    }

    /// Make every `delete_task` fail.
    pub fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    pub fn projects(&self) -> Vec<Project> {
        self.lock().projects.clone()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.lock().labels.clone()
    }

    pub fn sections(&self) -> Vec<Section> {
        self.lock().sections.clone()
    }

    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.lock().tasks.clone()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn write_calls(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    fn record(&self, call: ApiCall) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

fn task_from_payload(id: String, task: &NewTask) -> TaskRecord {
    let due = match (&task.due_string, &task.due_datetime) {
        (Some(string), _) => Some(Due {
            string: Some(string.clone()),
            lang: task.due_lang.clone(),
            ..Due::default()
        }),
        (None, Some(datetime)) => Some(Due {
            date: datetime.get(..10).map(str::to_string),
            string: Some(datetime.clone()),
            datetime: Some(datetime.clone()),
            ..Due::default()
        }),
        (None, None) => None,
    };
    let duration = task.duration.map(|amount| TaskDuration {
        amount,
        unit: task.duration_unit.unwrap_or(DurationUnit::Minute),
    });
    TaskRecord {
        url: Some(format!("memory://tasks/{id}")),
        id,
        content: task.content.clone(),
        description: task.description.clone().unwrap_or_default(),
        project_id: task.project_id.clone(),
        section_id: task.section_id.clone(),
        labels: task.labels.clone(),
        priority: task.priority,
        due,
        duration,
    }
}

#[async_trait]
impl TaskApi for MemoryTaskApi {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.record(ApiCall::ListProjects).projects.clone())
    }

    async fn create_project(&self, name: &str) -> Result<Project, ApiError> {
        let mut state = self.record(ApiCall::CreateProject(name.to_string()));
        let project = Project {
            id: new_id(),
            name: name.to_string(),
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        Ok(self.record(ApiCall::ListLabels).labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<Label, ApiError> {
        let mut state = self.record(ApiCall::CreateLabel(name.to_string()));
        let label = Label {
            id: new_id(),
            name: name.to_string(),
        };
        state.labels.push(label.clone());
        Ok(label)
    }

    async fn list_sections(&self, project_id: &str) -> Result<Vec<Section>, ApiError> {
        let state = self.record(ApiCall::ListSections(project_id.to_string()));
        Ok(state
            .sections
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn create_section(&self, project_id: &str, name: &str) -> Result<Section, ApiError> {
        let mut state = self.record(ApiCall::CreateSection {
            project_id: project_id.to_string(),
            name: name.to_string(),
        });
        if !state.projects.iter().any(|p| p.id == project_id) {
            return Err(ApiError::NotFound {
                kind: "project",
                id: project_id.to_string(),
            });
        }
        let section = Section {
            id: new_id(),
            project_id: project_id.to_string(),
            name: name.to_string(),
        };
        state.sections.push(section.clone());
        Ok(section)
    }

    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<TaskRecord>, ApiError> {
        let state = self.record(ApiCall::ListTasks(project_id.map(str::to_string)));
        Ok(state
            .tasks
            .iter()
            .filter(|t| project_id.is_none() || t.project_id.as_deref() == project_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &NewTask) -> Result<TaskRecord, ApiError> {
        let mut state = self.record(ApiCall::CreateTask(task.content.clone()));
        if state.failing_contents.contains(&task.content) {
            return Err(injected("/tasks"));
        }
        if let Some(project_id) = &task.project_id {
            if !state.projects.iter().any(|p| &p.id == project_id) {
                return Err(ApiError::NotFound {
                    kind: "project",
                    id: project_id.clone(),
                });
            }
        }
        let record = task_from_payload(new_id(), task);
        state.tasks.push(record.clone());
        Ok(record)
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<TaskRecord, ApiError> {
        let mut state = self.record(ApiCall::UpdateTask(id.to_string()));
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ApiError::NotFound {
                kind: "task",
                id: id.to_string(),
            })?;
        if let Some(content) = &update.content {
            task.content = content.clone();
        }
        if let Some(description) = &update.description {
            task.description = description.clone();
        }
        if let Some(labels) = &update.labels {
            task.labels = labels.clone();
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(string) = &update.due_string {
            task.due = Some(Due {
                string: Some(string.clone()),
                lang: update.due_lang.clone(),
                ..Due::default()
            });
        } else if let Some(datetime) = &update.due_datetime {
            task.due = Some(Due {
                date: datetime.get(..10).map(str::to_string),
                datetime: Some(datetime.clone()),
                ..Due::default()
            });
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::DeleteTask(id.to_string()));
        if state.fail_deletes {
            return Err(injected(&format!("/tasks/{id}")));
        }
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(ApiError::NotFound {
                kind: "task",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
