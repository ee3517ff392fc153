pub mod memory;
pub mod todoist;
pub mod traits;

pub use memory::{ApiCall, MemoryTaskApi};
pub use todoist::{TodoistClient, DEFAULT_BASE_URL};
pub use traits::TaskApi;
