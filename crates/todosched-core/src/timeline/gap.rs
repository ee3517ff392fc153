//! Free-slot detection inside a daily workday window.
//!
//! Busy intervals are merged into a disjoint set, then subtracted from each
//! day's window; the remaining gaps long enough to be useful are the free
//! slots.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// `None` unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Part of `self` inside `window`, if any.
    pub fn clip(&self, window: &Interval) -> Option<Interval> {
        Interval::new(self.start.max(window.start), self.end.min(window.end))
    }
}

/// Sort by start and merge overlapping or touching intervals.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort();
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match merged.last_mut() {
            // Touching counts: [9,10) and [10,11) become [9,11).
            Some(current) if next.start <= current.end => {
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Gaps of `window` not covered by `busy`, left to right.
///
/// `busy` must be sorted and disjoint (see [`merge_intervals`]). Gaps shorter
/// than `min_len` are dropped; empty gaps are never emitted.
pub fn subtract(window: Interval, busy: &[Interval], min_len: Duration) -> Vec<Interval> {
    let mut gaps = Vec::new();
    let mut cursor = window.start;

    let mut emit = |start: DateTime<Utc>, end: DateTime<Utc>| {
        if let Some(gap) = Interval::new(start, end) {
            if gap.duration() >= min_len {
                gaps.push(gap);
            }
        }
    };

    for block in busy.iter().filter_map(|b| b.clip(&window)) {
        if block.start > cursor {
            emit(cursor, block.start);
        }
        cursor = cursor.max(block.end);
        if cursor >= window.end {
            break;
        }
    }
    emit(cursor, window.end);

    gaps
}

/// A free slot, reported in the query timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub duration_minutes: i64,
}

impl FreeSlot {
    pub fn from_interval(interval: Interval, tz: Tz) -> Self {
        Self {
            start: time::in_zone(interval.start, tz),
            end: time::in_zone(interval.end, tz),
            duration_minutes: interval.duration().num_minutes(),
        }
    }
}

/// Time-of-day range applied to every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkdayWindow {
    /// `None` unless `end > start`; windows crossing midnight are not supported.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }
}

/// Computes free slots per day over a date range.
pub struct FreeSlotCalculator {
    workday: WorkdayWindow,
    timezone: Tz,
    min_slot_minutes: i64,
}

impl FreeSlotCalculator {
    pub fn new(workday: WorkdayWindow, timezone: Tz) -> Self {
        Self {
            workday,
            timezone,
            min_slot_minutes: 0,
        }
    }

    /// Set the minimum slot length
    pub fn with_min_slot(mut self, minutes: i64) -> Self {
        self.min_slot_minutes = minutes.max(0);
        self
    }

    /// Window of `date`, clipped to `range`.
    pub fn day_window(&self, date: NaiveDate, range: &Interval) -> Option<Interval> {
        let start = time::localize(self.timezone, date.and_time(self.workday.start));
        let end = time::localize(self.timezone, date.and_time(self.workday.end));
        Interval::new(start, end)?.clip(range)
    }

    /// Free intervals for `[from, to]` (inclusive dates) given busy intervals.
    pub fn free_intervals(&self, busy: &[Interval], from: NaiveDate, to: NaiveDate) -> Vec<Interval> {
        let range_start = time::day_bounds(self.timezone, from).0;
        let range_end = time::day_bounds(self.timezone, to).1;
        let Some(range) = Interval::new(range_start, range_end) else {
            return Vec::new();
        };

        let merged = merge_intervals(busy.to_vec());
        let Some(min_len) = Duration::try_minutes(self.min_slot_minutes) else {
            return Vec::new();
        };

        let mut slots = Vec::new();
        for date in from.iter_days().take_while(|d| *d <= to) {
            let Some(window) = self.day_window(date, &range) else {
                continue;
            };
            let overlapping: Vec<Interval> = merged
                .iter()
                .filter(|b| b.overlaps(&window))
                .copied()
                .collect();
            slots.extend(subtract(window, &overlapping, min_len));
        }
        slots
    }

    /// Free slots for `[from, to]`, rendered in the calculator's timezone.
    pub fn compute(&self, busy: &[Interval], from: NaiveDate, to: NaiveDate) -> Vec<FreeSlot> {
        self.free_intervals(busy, from, to)
            .into_iter()
            .map(|i| FreeSlot::from_interval(i, self.timezone))
            .collect()
    }
}
