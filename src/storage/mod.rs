mod activity;
mod error;
mod kv;

pub use activity::{ActivityStore, TotalStats};
pub use error::StorageError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
