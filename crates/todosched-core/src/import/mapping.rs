//! Item validation and merging with import defaults.

use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;
use crate::schedule::{ImportMode, ImportOptions, ScheduleItem};
use crate::task::{DurationUnit, NewTask, DEFAULT_PRIORITY, TIME_BLOCK_PREFIX, TIME_BLOCK_SEPARATOR};
use crate::time;

/// An item after validation, with names still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedItem {
    pub content: String,
    pub description: Option<String>,
    pub project_name: Option<String>,
    pub section_name: Option<String>,
    pub labels: Vec<String>,
    pub priority: u8,
    pub due_string: Option<String>,
    pub due_lang: Option<String>,
    /// UTC, RFC 3339.
    pub due_datetime: Option<String>,
    pub duration_minutes: Option<u32>,
}

impl PreparedItem {
    pub fn into_new_task(
        self,
        project_id: Option<String>,
        section_id: Option<String>,
        labels: Vec<String>,
    ) -> NewTask {
        NewTask {
            content: self.content,
            description: self.description,
            project_id,
            section_id,
            labels,
            priority: self.priority,
            due_string: self.due_string,
            due_lang: self.due_lang,
            due_datetime: self.due_datetime,
            duration: self.duration_minutes,
            duration_unit: self.duration_minutes.map(|_| DurationUnit::Minute),
        }
    }
}

/// Decode one raw item. Missing `title` or wrongly typed fields fail here.
pub fn decode_item(raw: &serde_json::Value) -> Result<ScheduleItem, ValidationError> {
    serde_json::from_value(raw.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Names are matched exactly as given; only all-blank names are dropped.
fn given_name(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

fn check_priority(field: &str, value: u8) -> Result<u8, ValidationError> {
    if (1..=4).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be between 1 and 4, got {value}"),
        ))
    }
}

/// Effective project name for an item.
pub fn effective_project(item: &ScheduleItem, options: &ImportOptions) -> Option<String> {
    if options.mode == ImportMode::ReplaceProject {
        if let Some(name) = given_name(options.replace_project_name.as_ref()) {
            return Some(name);
        }
    }
    given_name(item.project_name.as_ref())
        .or_else(|| given_name(options.default_project_name.as_ref()))
}

/// Default labels followed by item labels, first occurrence kept.
pub fn merged_labels(item: &ScheduleItem, options: &ImportOptions) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for name in options.default_labels.iter().chain(item.labels.iter()) {
        if !name.trim().is_empty() && !labels.contains(name) {
            labels.push(name.clone());
        }
    }
    labels
}

/// Validate `item` and merge it with `options`.
///
/// `default_tz` is the request-level timezone (options, else config) and is
/// used when the item names none.
pub fn prepare(
    item: &ScheduleItem,
    options: &ImportOptions,
    default_tz: Tz,
) -> Result<PreparedItem, ValidationError> {
    if item.title.trim().is_empty() {
        return Err(ValidationError::MissingField("title".into()));
    }

    let priority = match (item.priority, options.default_priority) {
        (Some(p), _) => check_priority("priority", p)?,
        (None, Some(p)) => check_priority("default_priority", p)?,
        (None, None) => DEFAULT_PRIORITY,
    };

    let tz = match non_blank(item.timezone.as_ref()) {
        Some(name) => time::parse_timezone("timezone", &name)?,
        None => default_tz,
    };

    let start = item
        .start_datetime
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|raw| time::parse_timestamp("start_datetime", raw, tz))
        .transpose()?;
    let end = item
        .end_datetime
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|raw| time::parse_timestamp("end_datetime", raw, tz))
        .transpose()?;

    if end.is_some() && start.is_none() {
        return Err(ValidationError::invalid(
            "end_datetime",
            "requires start_datetime",
        ));
    }
    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            return Err(ValidationError::InvalidRange {
                start_field: "start_datetime".into(),
                start: s.to_rfc3339(),
                end_field: "end_datetime".into(),
                end: e.to_rfc3339(),
            });
        }
    }

    let due_string = non_blank(item.due_string.as_ref());
    let due_datetime = match (&due_string, start) {
        (None, Some(s)) => Some(
            s.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        _ => None,
    };

    let duration = match (item.duration_minutes, start, end) {
        (Some(minutes), _, _) => Some(minutes),
        (None, Some(s), Some(e)) => Some((e - s).num_minutes()),
        _ => None,
    };
    let duration_minutes = match duration {
        None => None,
        Some(m) if m <= 0 => {
            return Err(ValidationError::invalid(
                "duration_minutes",
                format!("must be positive, got {m}"),
            ))
        }
        Some(m) => Some(u32::try_from(m).map_err(|_| {
            ValidationError::invalid("duration_minutes", format!("too large: {m}"))
        })?),
    };
    if duration_minutes.is_some() && due_string.is_none() && due_datetime.is_none() {
        return Err(ValidationError::invalid(
            "duration_minutes",
            "requires due_string or start_datetime",
        ));
    }

    let project_name = effective_project(item, options);
    let section_name = given_name(item.section_name.as_ref());
    if section_name.is_some() && project_name.is_none() {
        return Err(ValidationError::invalid(
            "section_name",
            "requires project_name or default_project_name",
        ));
    }

    let mut description_parts = Vec::new();
    if let Some(desc) = non_blank(item.description.as_ref()) {
        description_parts.push(desc);
    }
    if let Some(s) = start {
        let mut block = format!("{TIME_BLOCK_PREFIX}{}", s.to_rfc3339());
        if let Some(e) = end {
            block.push_str(TIME_BLOCK_SEPARATOR);
            block.push_str(&e.to_rfc3339());
        }
        description_parts.push(block);
    }
    let description = (!description_parts.is_empty()).then(|| description_parts.join("\n"));

    let content = format!(
        "{}{}{}",
        options.title_prefix.as_deref().unwrap_or(""),
        item.title,
        options.title_suffix.as_deref().unwrap_or("")
    );

    Ok(PreparedItem {
        content,
        description,
        project_name,
        section_name,
        labels: merged_labels(item, options),
        priority,
        due_lang: due_string.as_ref().and_then(|_| non_blank(item.due_lang.as_ref())),
        due_string,
        due_datetime,
        duration_minutes,
    })
}
