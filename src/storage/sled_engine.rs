//! sled-backed durable storage. Each partition maps to a separate sled
//! `Tree`.

use std::path::Path;

use super::{missing_partition, Cursor, KvPair, Partition, StorageEngine};
use crate::core::{ErrorKind, SQLError};

impl From<sled::Error> for SQLError {
    fn from(e: sled::Error) -> Self {
        SQLError::new(ErrorKind::StorageFault, format!("sled error: {}", e))
    }
}

pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    /// Open the store at the given directory, creating it if needed.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open a temporary store (for testing). Data is deleted on drop.
    pub fn open_temporary() -> Result<Self, SQLError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn has_tree(&self, name: &str) -> bool {
        self.db
            .tree_names()
            .iter()
            .any(|tree_name| tree_name.to_vec() == name.as_bytes())
    }
}

impl StorageEngine for SledStorage {
    fn open_partition(&self, name: &str, create: bool) -> Result<Box<dyn Partition>, SQLError> {
        if !create && !self.has_tree(name) {
            return Err(missing_partition(name));
        }

        let tree = self.db.open_tree(name)?;
        Ok(Box::new(SledPartition {
            name: name.to_string(),
            tree,
        }))
    }

    fn remove_partition(&self, name: &str) -> Result<(), SQLError> {
        if self.db.drop_tree(name)? {
            Ok(())
        } else {
            Err(missing_partition(name))
        }
    }

    fn generate_id(&self) -> Result<u64, SQLError> {
        Ok(self.db.generate_id()?)
    }

    fn flush(&self) -> Result<(), SQLError> {
        self.db.flush()?;
        Ok(())
    }
}

pub struct SledPartition {
    name: String,
    tree: sled::Tree,
}

impl Partition for SledPartition {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), SQLError> {
        self.tree.insert(key, value)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SQLError> {
        Ok(self.tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn delete(&self, key: &[u8]) -> Result<bool, SQLError> {
        Ok(self.tree.remove(key)?.is_some())
    }

    fn len(&self) -> Result<usize, SQLError> {
        Ok(self.tree.len())
    }

    fn cursor(&self) -> Result<Box<dyn Cursor>, SQLError> {
        Ok(Box::new(SledCursor {
            iter: self.tree.iter(),
            exhausted: false,
        }))
    }
}

pub struct SledCursor {
    iter: sled::Iter,
    exhausted: bool,
}

impl Cursor for SledCursor {
    fn next_entry(&mut self) -> Result<Option<KvPair>, SQLError> {
        if self.exhausted {
            return Ok(None);
        }

        match self.iter.next() {
            Some(item) => {
                let (k, v) = item?;
                Ok(Some((k.to_vec(), v.to_vec())))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}
