//! Schedule import types: items, options, and the import response.

use serde::{Deserialize, Serialize};

/// One class or time block, mapped to one task.
///
/// Timestamps stay as strings here and are parsed during validation, so a
/// malformed value fails only its own item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Task title, e.g. "A2-1 Further Math".
    pub title: String,
    /// Free-form notes: room, teacher, delivery mode.
    #[serde(default)]
    pub description: Option<String>,
    /// Created when absent.
    #[serde(default)]
    pub project_name: Option<String>,
    /// Created inside the item's project when absent.
    #[serde(default)]
    pub section_name: Option<String>,
    /// Created when absent.
    #[serde(default)]
    pub labels: Vec<String>,
    /// 1 (normal) to 4 (urgent).
    #[serde(default)]
    pub priority: Option<u8>,
    /// Natural-language due, e.g. "every Monday at 9:00".
    #[serde(default)]
    pub due_string: Option<String>,
    /// Language of `due_string`, e.g. "en".
    #[serde(default)]
    pub due_lang: Option<String>,
    /// RFC 3339, or naive local time in `timezone`.
    #[serde(default)]
    pub start_datetime: Option<String>,
    #[serde(default)]
    pub end_datetime: Option<String>,
    /// IANA name, e.g. "Asia/Singapore".
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Only add tasks.
    #[default]
    Create,
    /// Empty `replace_project_name` first, then add every item to it.
    ReplaceProject,
}

/// Options applied to every item of one import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub mode: ImportMode,
    pub replace_project_name: Option<String>,
    /// Resolve and validate everything, write nothing.
    pub dry_run: bool,
    pub default_project_name: Option<String>,
    pub default_labels: Vec<String>,
    pub default_priority: Option<u8>,
    pub default_timezone: Option<String>,
    pub title_prefix: Option<String>,
    pub title_suffix: Option<String>,
}

/// Import request body.
///
/// Items are kept as raw JSON and decoded one at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub options: Option<ImportOptions>,
}

impl ImportRequest {
    pub fn from_items(items: &[ScheduleItem], options: Option<ImportOptions>) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| serde_json::to_value(item).unwrap_or_default())
                .collect(),
            options,
        }
    }
}

/// Task id reported for items in a dry run.
pub const DRY_RUN_TASK_ID: &str = "dry-run";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub index: usize,
    pub task_id: String,
    pub content: String,
    pub project_id: Option<String>,
    pub section_id: Option<String>,
    pub labels: Vec<String>,
    pub priority: u8,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing input.
    Validation,
    /// The task service rejected or failed the task write.
    Api,
    /// A project, section or label could not be looked up or created.
    Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub index: usize,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub created: Vec<CreatedTask>,
    pub errors: Vec<ErrorInfo>,
    /// Tasks removed (or, in a dry run, that would be removed) in replace mode.
    pub deleted: usize,
    pub dry_run: bool,
}
