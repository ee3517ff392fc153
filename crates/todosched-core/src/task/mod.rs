//! Task service entities as they appear on the wire.
//!
//! `TaskRecord`, `Project`, `Label` and `Section` mirror the Todoist REST v2
//! JSON shapes. They are read-only from this crate's point of view: the
//! service is the only place they are stored. `NewTask` and `TaskUpdate` are
//! the write payloads.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time;

/// Marker line written into task descriptions for explicit time blocks.
pub const TIME_BLOCK_PREFIX: &str = "Time block: ";
/// Separator between the start and end timestamps of a time block line.
pub const TIME_BLOCK_SEPARATOR: &str = " ~ ";

/// Priority used when neither the item nor the options set one.
pub const DEFAULT_PRIORITY: u8 = 1;

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub project_id: String,
    pub name: String,
}

/// Due information attached to a task.
///
/// `datetime` is present only for timed tasks. It is either RFC 3339 with a
/// `Z`/offset, or floating wall-clock time when `timezone` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Due {
    /// Instant of a timed due. Floating times are read in the due's own
    /// timezone, or `fallback` when it has none.
    pub fn timed(&self, fallback: Tz) -> Option<DateTime<Utc>> {
        let raw = self.datetime.as_deref()?;
        let tz = self
            .timezone
            .as_deref()
            .and_then(|name| time::parse_timezone("timezone", name).ok())
            .unwrap_or(fallback);
        time::parse_timestamp("due.datetime", raw, tz)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Timed due if any, else local midnight of a date-only due.
    pub fn resolve(&self, fallback: Tz) -> Option<DateTime<Utc>> {
        if let Some(dt) = self.timed(fallback) {
            return Some(dt);
        }
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        Some(time::day_bounds(fallback, date).0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minute,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDuration {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl TaskDuration {
    pub fn minutes(amount: u32) -> Self {
        Self {
            amount,
            unit: DurationUnit::Minute,
        }
    }

    pub fn as_duration(&self) -> Duration {
        match self.unit {
            DurationUnit::Minute => Duration::minutes(i64::from(self.amount)),
            DurationUnit::Day => Duration::days(i64::from(self.amount)),
        }
    }

    pub fn in_minutes(&self) -> i64 {
        self.as_duration().num_minutes()
    }
}

/// A task as returned by the task service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub due: Option<Due>,
    #[serde(default)]
    pub duration: Option<TaskDuration>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TaskRecord {
    /// Resolved due timestamp; date-only dues resolve to local midnight.
    pub fn due_at(&self, tz: Tz) -> Option<DateTime<Utc>> {
        self.due.as_ref()?.resolve(tz)
    }

    /// End of the `Time block: start ~ end` line in the description, if any.
    pub fn time_block_end(&self, tz: Tz) -> Option<DateTime<Utc>> {
        let line = self
            .description
            .lines()
            .find_map(|l| l.trim().strip_prefix(TIME_BLOCK_PREFIX))?;
        let (_, end) = line.split_once(TIME_BLOCK_SEPARATOR.trim())?;
        time::parse_timestamp("time_block", end, tz)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Span the task reserves: timed due plus duration, or timed due up to
    /// the time block end. `None` for untimed tasks and for empty or unrepresentable spans.
    pub fn occupied(&self, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.due.as_ref()?.timed(tz)?;
        let end = match self.duration {
            Some(d) => start.checked_add_signed(d.as_duration())?,
            None => self.time_block_end(tz)?,
        };
        (end > start).then_some((start, end))
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<DurationUnit>,
}

/// Payload for updating a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_datetime: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> Tz {
        chrono_tz::UTC
    }

    fn timed_task(datetime: &str, duration: Option<TaskDuration>, description: &str) -> TaskRecord {
        TaskRecord {
            id: "1".into(),
            content: "Further Math".into(),
            description: description.into(),
            project_id: None,
            section_id: None,
            labels: vec![],
            priority: 1,
            due: Some(Due {
                datetime: Some(datetime.into()),
                ..Due::default()
            }),
            duration,
            url: None,
        }
    }

    #[test]
    fn decodes_service_task_shape() {
        let json = r#"{
            "id": "2995104339",
            "content": "Buy Milk",
            "description": "",
            "project_id": "2203306141",
            "section_id": null,
            "labels": ["Food", "Shopping"],
            "priority": 4,
            "due": {
                "date": "2016-09-01",
                "is_recurring": false,
                "datetime": "2016-09-01T12:00:00.000000Z",
                "string": "tomorrow at 12",
                "timezone": "Europe/Moscow"
            },
            "duration": {"amount": 15, "unit": "minute"},
            "url": "https://todoist.com/showTask?id=2995104339",
            "comment_count": 10
        }"#;
        let task: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(task.labels, vec!["Food", "Shopping"]);
        assert_eq!(task.duration, Some(TaskDuration::minutes(15)));
        assert_eq!(
            task.due_at(utc()).unwrap().to_rfc3339(),
            "2016-09-01T12:00:00+00:00"
        );
    }

    #[test]
    fn floating_due_uses_fallback_zone() {
        let task = timed_task("2025-11-18T09:00:00", None, "");
        let sgt: Tz = "Asia/Singapore".parse().unwrap();
        assert_eq!(
            task.due_at(sgt).unwrap().to_rfc3339(),
            "2025-11-18T01:00:00+00:00"
        );
    }

    #[test]
    fn date_only_due_resolves_to_midnight_but_never_occupies() {
        let task = TaskRecord {
            due: Some(Due {
                date: Some("2025-11-18".into()),
                string: Some("every monday".into()),
                ..Due::default()
            }),
            duration: Some(TaskDuration::minutes(30)),
            ..timed_task("", None, "")
        };
        assert_eq!(
            task.due_at(utc()).unwrap().to_rfc3339(),
            "2025-11-18T00:00:00+00:00"
        );
        assert!(task.occupied(utc()).is_none());
    }

    #[test]
    fn occupied_from_duration() {
        let task = timed_task("2025-11-18T09:05:00Z", Some(TaskDuration::minutes(90)), "");
        let (start, end) = task.occupied(utc()).unwrap();
        assert_eq!((end - start).num_minutes(), 90);
    }

    #[test]
    fn occupied_from_time_block_line() {
        let task = timed_task(
            "2025-11-18T01:00:00Z",
            None,
            "Room 204\nTime block: 2025-11-18T09:00:00+08:00 ~ 2025-11-18T10:30:00+08:00",
        );
        let (start, end) = task.occupied(utc()).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-11-18T01:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-11-18T02:30:00+00:00");
    }

    #[test]
    fn timed_task_without_duration_is_zero_width() {
        let task = timed_task("2025-11-18T09:00:00Z", None, "no block here");
        assert!(task.occupied(utc()).is_none());
    }

    #[test]
    fn day_duration_spans_whole_days() {
        let d = TaskDuration {
            amount: 2,
            unit: DurationUnit::Day,
        };
        assert_eq!(d.in_minutes(), 2 * 24 * 60);
    }

    #[test]
    fn duration_past_the_calendar_occupies_nothing() {
        let huge = TaskDuration {
            amount: u32::MAX,
            unit: DurationUnit::Day,
        };
        let task = timed_task("2025-11-18T09:00:00Z", Some(huge), "");
        assert!(task.occupied(utc()).is_none());
    }

    #[test]
    fn new_task_omits_empty_fields() {
        let payload = NewTask {
            content: "Physics".into(),
            priority: 2,
            ..NewTask::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"content": "Physics", "priority": 2}));
    }
}
