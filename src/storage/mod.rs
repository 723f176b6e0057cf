//! Boundary to the key-value storage engine.
//!
//! A relation lives in its own named partition. Partitions support point
//! reads and writes keyed by the encoded primary key, and an unordered full
//! scan through a [`Cursor`]. Nothing here is transactional.

use std::sync::PoisonError;

use log::info;

use crate::{
    core::{ErrorKind, SQLError},
    sql::session::context::Config,
};

pub mod memory;
pub mod sled_engine;

pub use memory::MemoryStorage;
pub use sled_engine::SledStorage;

pub type KvPair = (Vec<u8>, Vec<u8>);

pub trait StorageEngine {
    /// Open a partition. When `create` is set a missing partition is
    /// created, otherwise opening it is a fault.
    fn open_partition(&self, name: &str, create: bool) -> Result<Box<dyn Partition>, SQLError>;

    fn remove_partition(&self, name: &str) -> Result<(), SQLError>;

    /// Fresh id, unique for the lifetime of the store.
    fn generate_id(&self) -> Result<u64, SQLError>;

    fn flush(&self) -> Result<(), SQLError>;
}

pub trait Partition {
    fn name(&self) -> &str;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), SQLError>;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SQLError>;

    fn delete(&self, key: &[u8]) -> Result<bool, SQLError>;

    fn len(&self) -> Result<usize, SQLError>;

    /// A new cursor positioned before the first entry.
    fn cursor(&self) -> Result<Box<dyn Cursor>, SQLError>;
}

pub trait Cursor {
    fn next_entry(&mut self) -> Result<Option<KvPair>, SQLError>;
}

/// Open the engine selected by the config: sled when a data directory is
/// given, memory otherwise.
pub fn open_storage(config: &Config) -> Result<Box<dyn StorageEngine>, SQLError> {
    match &config.data_dir {
        Some(path) => {
            info!("Opening sled storage at {}", path.display());
            Ok(Box::new(SledStorage::open(path)?))
        }
        None => {
            info!("Using in-memory storage");
            Ok(Box::new(MemoryStorage::new()))
        }
    }
}

pub(crate) fn poisoned<T>(_: PoisonError<T>) -> SQLError {
    SQLError::new(ErrorKind::StorageFault, "storage lock poisoned")
}

pub(crate) fn missing_partition(name: &str) -> SQLError {
    SQLError::new(
        ErrorKind::StorageFault,
        format!("partition {} does not exist", name),
    )
}
