// Shared utilities

pub mod constants;
pub mod query;
pub mod storage;

pub use constants::*;
pub use query::QueryParams;
pub use storage::{BrowserStorage, MemoryStorage, SessionStorage, StorageError};
