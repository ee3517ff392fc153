//! Schedule import: items in, one task write per item out.
//!
//! Per-item failures (bad input, unresolvable names, rejected writes) are
//! collected in the response and the batch carries on. Two things abort the
//! whole request: the initial project/label listing, and any failure while
//! emptying the target project in `replace_project` mode.

pub mod mapping;
pub mod resolver;

pub use mapping::{decode_item, prepare, PreparedItem};
pub use resolver::{NameCache, Resolver, DRY_RUN_ID_PREFIX};

use chrono_tz::Tz;

use crate::error::{ApiError, CoreError, Result, ValidationError};
use crate::integrations::TaskApi;
use crate::schedule::{
    CreatedTask, ErrorInfo, ErrorKind, ImportMode, ImportOptions, ImportRequest, ImportResponse,
    DRY_RUN_TASK_ID,
};
use crate::time;

/// Why a single item failed.
#[derive(Debug)]
enum ItemError {
    Validation(ValidationError),
    Resolution { what: String, source: ApiError },
    Api(ApiError),
}

impl ItemError {
    fn into_info(self, index: usize) -> ErrorInfo {
        let (kind, message) = match self {
            ItemError::Validation(e) => (ErrorKind::Validation, e.to_string()),
            ItemError::Resolution { what, source } => (
                ErrorKind::Resolution,
                format!("Could not resolve {what}: {source}"),
            ),
            ItemError::Api(e) => (ErrorKind::Api, format!("Todoist error: {e}")),
        };
        ErrorInfo {
            index,
            kind,
            message,
        }
    }
}

impl From<ValidationError> for ItemError {
    fn from(err: ValidationError) -> Self {
        ItemError::Validation(err)
    }
}

fn resolution(what: String) -> impl FnOnce(ApiError) -> ItemError {
    move |source| ItemError::Resolution { what, source }
}

/// Runs one import request against a [`TaskApi`].
pub struct Importer<'a, A: TaskApi + ?Sized> {
    api: &'a A,
    default_timezone: Tz,
}

impl<'a, A: TaskApi + ?Sized> Importer<'a, A> {
    /// `default_timezone` applies when neither the options nor an item name one.
    pub fn new(api: &'a A, default_timezone: Tz) -> Self {
        Self {
            api,
            default_timezone,
        }
    }

    fn validate_options(&self, items: usize, options: &ImportOptions) -> Result<Tz> {
        if items == 0 {
            return Err(ValidationError::invalid("items", "must contain at least one item").into());
        }
        if let Some(p) = options.default_priority {
            if !(1..=4).contains(&p) {
                return Err(ValidationError::invalid(
                    "default_priority",
                    format!("must be between 1 and 4, got {p}"),
                )
                .into());
            }
        }
        if options.mode == ImportMode::ReplaceProject
            && options
                .replace_project_name
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(ValidationError::MissingField("replace_project_name".into()).into());
        }
        match options.default_timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(time::parse_timezone("default_timezone", name)?),
            _ => Ok(self.default_timezone),
        }
    }

    /// Run the import.
    ///
    /// # Errors
    ///
    /// Request-level validation failures, a failed initial listing, and
    /// failures while emptying the project in replace mode. Everything else is
    /// reported per item in the response.
    pub async fn run(&self, request: ImportRequest) -> Result<ImportResponse> {
        let options = request.options.unwrap_or_default();
        let default_tz = self.validate_options(request.items.len(), &options)?;

        let mut resolver = Resolver::load(self.api, options.dry_run).await?;
        let mut response = ImportResponse {
            dry_run: options.dry_run,
            ..ImportResponse::default()
        };

        if options.mode == ImportMode::ReplaceProject {
            let target = options.replace_project_name.as_deref().unwrap_or_default();
            response.deleted = self
                .clear_project(&mut resolver, target, options.dry_run)
                .await?;
        }

        for (index, raw) in request.items.iter().enumerate() {
            match self
                .import_item(&mut resolver, raw, &options, default_tz)
                .await
            {
                Ok(created) => response.created.push(CreatedTask { index, ..created }),
                Err(err) => {
                    let info = err.into_info(index);
                    tracing::warn!(index, kind = ?info.kind, message = %info.message, "import item failed");
                    response.errors.push(info);
                }
            }
        }

        tracing::info!(
            service = self.api.name(),
            created = response.created.len(),
            failed = response.errors.len(),
            deleted = response.deleted,
            dry_run = options.dry_run,
            "import finished"
        );
        Ok(response)
    }

    /// Delete every task in `project`. Returns how many were (or would be)
    /// deleted. Any failure aborts.
    async fn clear_project(
        &self,
        resolver: &mut Resolver<'_, A>,
        project: &str,
        dry_run: bool,
    ) -> Result<usize> {
        let aborted = |source: ApiError| CoreError::ReplaceAborted {
            project: project.to_string(),
            source,
        };

        let project_id = resolver.project_id(project).await.map_err(aborted)?;
        if project_id.starts_with(DRY_RUN_ID_PREFIX) {
            return Ok(0);
        }

        let tasks = self
            .api
            .list_tasks(Some(&project_id))
            .await
            .map_err(aborted)?;
        if dry_run {
            return Ok(tasks.len());
        }

        for task in &tasks {
            self.api.delete_task(&task.id).await.map_err(aborted)?;
        }
        tracing::info!(project, deleted = tasks.len(), "emptied project");
        Ok(tasks.len())
    }

    async fn import_item(
        &self,
        resolver: &mut Resolver<'_, A>,
        raw: &serde_json::Value,
        options: &ImportOptions,
        default_tz: Tz,
    ) -> std::result::Result<CreatedTask, ItemError> {
        let item = decode_item(raw)?;
        let prepared = prepare(&item, options, default_tz)?;

        let project_id = match &prepared.project_name {
            Some(name) => Some(
                resolver
                    .project_id(name)
                    .await
                    .map_err(resolution(format!("project '{name}'")))?,
            ),
            None => None,
        };

        let section_id = match (&prepared.section_name, &project_id) {
            (Some(name), Some(pid)) => Some(
                resolver
                    .section_id(pid, name)
                    .await
                    .map_err(resolution(format!("section '{name}'")))?,
            ),
            _ => None,
        };

        let mut labels = Vec::with_capacity(prepared.labels.len());
        for name in &prepared.labels {
            labels.push(
                resolver
                    .label(name)
                    .await
                    .map_err(resolution(format!("label '{name}'")))?,
            );
        }

        let payload = prepared.into_new_task(project_id, section_id, labels);

        if options.dry_run {
            return Ok(CreatedTask {
                index: 0,
                task_id: DRY_RUN_TASK_ID.to_string(),
                content: payload.content,
                project_id: payload.project_id,
                section_id: payload.section_id,
                labels: payload.labels,
                priority: payload.priority,
                dry_run: true,
            });
        }

        let task = self
            .api
            .create_task(&payload)
            .await
            .map_err(ItemError::Api)?;
        tracing::debug!(id = %task.id, content = %task.content, "created task");
        Ok(CreatedTask {
            index: 0,
            task_id: task.id,
            content: task.content,
            project_id: task.project_id,
            section_id: task.section_id,
            labels: task.labels,
            priority: task.priority,
            dry_run: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{ApiCall, MemoryTaskApi};
    use crate::schedule::ScheduleItem;

    fn sgt() -> Tz {
        "Asia/Singapore".parse().unwrap()
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let api = MemoryTaskApi::new();
        let err = Importer::new(&api, sgt())
            .run(ImportRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn replace_mode_needs_target() {
        let api = MemoryTaskApi::new();
        let request = ImportRequest::from_items(
            &[ScheduleItem {
                title: "Physics".into(),
                ..ScheduleItem::default()
            }],
            Some(ImportOptions {
                mode: ImportMode::ReplaceProject,
                ..ImportOptions::default()
            }),
        );
        let err = Importer::new(&api, sgt()).run(request).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn bad_default_timezone_is_request_level() {
        let api = MemoryTaskApi::new();
        let request = ImportRequest::from_items(
            &[ScheduleItem {
                title: "Physics".into(),
                ..ScheduleItem::default()
            }],
            Some(ImportOptions {
                default_timezone: Some("Atlantis/Capital".into()),
                ..ImportOptions::default()
            }),
        );
        assert!(Importer::new(&api, sgt()).run(request).await.is_err());
    }

    #[tokio::test]
    async fn project_names_match_exactly() {
        let api = MemoryTaskApi::new();
        let spaced = api.add_project(" Timetable");
        let request = ImportRequest::from_items(
            &[ScheduleItem {
                title: "Physics".into(),
                project_name: Some(" Timetable".into()),
                ..ScheduleItem::default()
            }],
            None,
        );
        let response = Importer::new(&api, sgt()).run(request).await.unwrap();
        assert!(response.errors.is_empty());
        assert_eq!(response.created[0].project_id.as_deref(), Some(spaced.id.as_str()));
        assert_eq!(api.write_calls(), vec![ApiCall::CreateTask("Physics".into())]);
    }

    #[test]
    fn item_errors_carry_kind_and_index() {
        let info = ItemError::Resolution {
            what: "label 'FMath'".into(),
            source: ApiError::MissingToken,
        }
        .into_info(3);
        assert_eq!(info.index, 3);
        assert_eq!(info.kind, ErrorKind::Resolution);
        assert!(info.message.starts_with("Could not resolve label 'FMath'"));
    }
}
