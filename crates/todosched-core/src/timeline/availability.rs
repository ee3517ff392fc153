//! Free-slot request handling.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::gap::{FreeSlot, FreeSlotCalculator, Interval, WorkdayWindow};
use crate::error::{ConfigError, Result, ValidationError};
use crate::integrations::TaskApi;
use crate::query::{fetch_tasks, one_or_many};
use crate::storage::Config;
use crate::time;

/// Longest date range a single request may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Largest minimum slot length, one full day.
pub const MAX_MIN_SLOT_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSlotRequest {
    #[serde(alias = "project_name", deserialize_with = "one_or_many")]
    pub project_names: Vec<String>,
    /// Required.
    pub date_from: Option<NaiveDate>,
    /// Defaults to `date_from`.
    pub date_to: Option<NaiveDate>,
    /// `HH:MM`; config default otherwise.
    pub workday_start: Option<String>,
    pub workday_end: Option<String>,
    pub min_slot_minutes: Option<i64>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreeSlotResponse {
    pub slots: Vec<FreeSlot>,
}

/// Values used when a request leaves a field out.
#[derive(Debug, Clone, Copy)]
pub struct FreeSlotDefaults {
    pub workday: WorkdayWindow,
    pub min_slot_minutes: i64,
    pub timezone: Tz,
}

impl FreeSlotDefaults {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let (start, end) = config.workday()?;
        let workday = WorkdayWindow::new(start, end).ok_or_else(|| ConfigError::InvalidValue {
            key: "free_slots.workday_end".into(),
            message: "must be later than workday_start".into(),
        })?;
        Ok(Self {
            workday,
            min_slot_minutes: config
                .free_slots
                .min_slot_minutes
                .clamp(0, MAX_MIN_SLOT_MINUTES),
            timezone: config.default_timezone()?,
        })
    }
}

struct Plan {
    calculator: FreeSlotCalculator,
    timezone: Tz,
    from: NaiveDate,
    to: NaiveDate,
}

fn plan(request: &FreeSlotRequest, defaults: &FreeSlotDefaults) -> Result<Plan, ValidationError> {
    let from = request
        .date_from
        .ok_or_else(|| ValidationError::MissingField("date_from".into()))?;
    let to = request.date_to.unwrap_or(from);
    if to < from {
        return Err(ValidationError::InvalidRange {
            start_field: "date_from".into(),
            start: from.to_string(),
            end_field: "date_to".into(),
            end: to.to_string(),
        });
    }
    let days = (to - from).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(ValidationError::invalid(
            "date_to",
            format!("range covers {days} days, at most {MAX_RANGE_DAYS} allowed"),
        ));
    }

    let start = match request.workday_start.as_deref() {
        Some(raw) => time::parse_time_of_day("workday_start", raw)?,
        None => defaults.workday.start,
    };
    let end = match request.workday_end.as_deref() {
        Some(raw) => time::parse_time_of_day("workday_end", raw)?,
        None => defaults.workday.end,
    };
    let workday = WorkdayWindow::new(start, end).ok_or_else(|| ValidationError::InvalidRange {
        start_field: "workday_start".into(),
        start: start.to_string(),
        end_field: "workday_end".into(),
        end: end.to_string(),
    })?;

    let min_slot = request.min_slot_minutes.unwrap_or(defaults.min_slot_minutes);
    if !(0..=MAX_MIN_SLOT_MINUTES).contains(&min_slot) {
        return Err(ValidationError::invalid(
            "min_slot_minutes",
            format!("must be between 0 and {MAX_MIN_SLOT_MINUTES}, got {min_slot}"),
        ));
    }

    let timezone = match request.timezone.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => time::parse_timezone("timezone", name)?,
        _ => defaults.timezone,
    };

    Ok(Plan {
        calculator: FreeSlotCalculator::new(workday, timezone).with_min_slot(min_slot),
        timezone,
        from,
        to,
    })
}

/// Fetch tasks and compute free slots for the requested range.
///
/// Only tasks with a timed due and a positive span occupy time; see
/// [`TaskRecord::occupied`](crate::task::TaskRecord::occupied).
pub async fn find_free_slots<A: TaskApi + ?Sized>(
    api: &A,
    request: &FreeSlotRequest,
    defaults: &FreeSlotDefaults,
) -> Result<FreeSlotResponse> {
    let plan = plan(request, defaults)?;
    let fetched = fetch_tasks(api, &request.project_names).await?;

    let busy: Vec<Interval> = fetched
        .tasks
        .iter()
        .filter_map(|t| t.occupied(plan.timezone))
        .filter_map(|(start, end)| Interval::new(start, end))
        .collect();
    tracing::debug!(
        tasks = fetched.tasks.len(),
        busy = busy.len(),
        from = %plan.from,
        to = %plan.to,
        "computing free slots"
    );

    Ok(FreeSlotResponse {
        slots: plan.calculator.compute(&busy, plan.from, plan.to),
    })
}
