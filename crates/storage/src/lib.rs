#![forbid(unsafe_code)]

pub mod json;
pub mod keys;
pub mod locks;
pub mod repository;
pub mod sqlite;

pub use locks::{KeyGuard, KeyLocks};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
