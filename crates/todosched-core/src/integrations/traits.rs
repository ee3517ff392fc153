use async_trait::async_trait;

use crate::error::ApiError;
use crate::task::{Label, NewTask, Project, Section, TaskRecord, TaskUpdate};

/// CRUD surface of the external task service.
///
/// Implementations are stateless between calls apart from connection
/// pooling; callers issue calls one at a time and feed identifiers returned
/// by earlier calls into later ones.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Short identifier used in logs (e.g. "todoist").
    fn name(&self) -> &str;

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn create_project(&self, name: &str) -> Result<Project, ApiError>;

    async fn list_labels(&self) -> Result<Vec<Label>, ApiError>;

    async fn create_label(&self, name: &str) -> Result<Label, ApiError>;

    async fn list_sections(&self, project_id: &str) -> Result<Vec<Section>, ApiError>;

    async fn create_section(&self, project_id: &str, name: &str) -> Result<Section, ApiError>;

    /// Active tasks, optionally scoped to one project.
    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<TaskRecord>, ApiError>;

    async fn create_task(&self, task: &NewTask) -> Result<TaskRecord, ApiError>;

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<TaskRecord, ApiError>;

    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;
}
