//! # todosched Core Library
//!
//! Turns class timetables and time blocks into Todoist tasks, and answers
//! read-side questions over the same tasks. The CLI binary and the HTTP
//! service are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Integrations**: the [`TaskApi`] trait, implemented by the Todoist REST
//!   client and by an in-memory backend
//! - **Import**: item validation, default merging, per-request name caches
//!   with create-on-miss, partial-failure batch semantics
//! - **Query**: project-scoped fetch plus label and due-range filtering
//! - **Timeline**: interval merging and free-slot computation per workday
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`Importer`]: runs an import request
//! - [`run_query`]: runs a task query
//! - [`find_free_slots`]: computes free slots
//! - [`Config`]: application configuration

pub mod error;
pub mod import;
pub mod integrations;
pub mod query;
pub mod schedule;
pub mod storage;
pub mod task;
pub mod time;
pub mod timeline;

pub use error::{ApiError, ConfigError, CoreError, ValidationError};
pub use import::Importer;
pub use integrations::{MemoryTaskApi, TaskApi, TodoistClient};
pub use query::{run_query, QueryResponse, TaskQuery, TaskView};
pub use schedule::{ImportMode, ImportOptions, ImportRequest, ImportResponse, ScheduleItem};
pub use storage::Config;
pub use task::{NewTask, TaskRecord, TaskUpdate};
pub use timeline::{find_free_slots, FreeSlot, FreeSlotDefaults, FreeSlotRequest, FreeSlotResponse};
