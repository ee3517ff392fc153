//! Todoist integration -- REST v2 client for projects, labels, sections and tasks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::traits::TaskApi;
use crate::error::{ApiError, ConfigError, CoreError};
use crate::storage::config::TodoistConfig;
use crate::task::{Label, NewTask, Project, Section, TaskRecord, TaskUpdate};

pub const DEFAULT_BASE_URL: &str = "https://api.todoist.com/rest/v2";

/// Longest response-body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for the Todoist REST API.
///
/// The token is handed in explicitly; nothing is read from the environment
/// here.
pub struct TodoistClient {
    http_client: Client,
    base_url: String,
    api_token: String,
}

impl TodoistClient {
    pub fn new(
        api_token: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(ApiError::MissingToken);
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// Build a client from the `[todoist]` config section.
    pub fn from_config(config: &TodoistConfig) -> Result<Self, CoreError> {
        url::Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "todoist.base_url".into(),
            message: e.to_string(),
        })?;
        let client = Self::new(
            config.api_token.clone(),
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "todoist request");
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_token)
    }

    /// Send and return the raw body of a successful response.
    async fn send_raw(&self, request: RequestBuilder, path: &str) -> Result<String, ApiError> {
        let resp = request.send().await.map_err(|source| ApiError::Transport {
            endpoint: path.to_string(),
            source,
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| ApiError::Transport {
            endpoint: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            let mut excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            if excerpt.is_empty() {
                excerpt = status.canonical_reason().unwrap_or("").to_string();
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
                body: excerpt,
            });
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let body = self.send_raw(request, path).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl TaskApi for TodoistClient {
    fn name(&self) -> &str {
        "todoist"
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let path = "/projects";
        self.send(self.request(Method::GET, path), path).await
    }

    async fn create_project(&self, name: &str) -> Result<Project, ApiError> {
        let path = "/projects";
        let req = self
            .request(Method::POST, path)
            .json(&json!({ "name": name }));
        self.send(req, path).await
    }

    async fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        let path = "/labels";
        self.send(self.request(Method::GET, path), path).await
    }

    async fn create_label(&self, name: &str) -> Result<Label, ApiError> {
        let path = "/labels";
        let req = self
            .request(Method::POST, path)
            .json(&json!({ "name": name }));
        self.send(req, path).await
    }

    async fn list_sections(&self, project_id: &str) -> Result<Vec<Section>, ApiError> {
        let path = "/sections";
        let req = self
            .request(Method::GET, path)
            .query(&[("project_id", project_id)]);
        self.send(req, path).await
    }

    async fn create_section(&self, project_id: &str, name: &str) -> Result<Section, ApiError> {
        let path = "/sections";
        let req = self
            .request(Method::POST, path)
            .json(&json!({ "name": name, "project_id": project_id }));
        self.send(req, path).await
    }

    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<TaskRecord>, ApiError> {
        let path = "/tasks";
        let mut req = self.request(Method::GET, path);
        if let Some(id) = project_id {
            req = req.query(&[("project_id", id)]);
        }
        self.send(req, path).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<TaskRecord, ApiError> {
        let path = "/tasks";
        let req = self.request(Method::POST, path).json(task);
        self.send(req, path).await
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<TaskRecord, ApiError> {
        let path = format!("/tasks/{id}");
        let req = self.request(Method::POST, &path).json(update);
        self.send(req, &path).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/tasks/{id}");
        self.send_raw(self.request(Method::DELETE, &path), &path)
            .await
            .map(|_| ())
    }
}
