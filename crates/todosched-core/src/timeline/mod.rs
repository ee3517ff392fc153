//! Free-slot computation.
//!
//! This module provides:
//! - Interval merging and subtraction inside a daily workday window
//! - The free-slot request: fetch tasks, derive busy intervals, compute gaps

mod availability;
mod gap;

pub use availability::{
    find_free_slots, FreeSlotDefaults, FreeSlotRequest, FreeSlotResponse, MAX_MIN_SLOT_MINUTES,
    MAX_RANGE_DAYS,
};
pub use gap::{merge_intervals, subtract, FreeSlot, FreeSlotCalculator, Interval, WorkdayWindow};
