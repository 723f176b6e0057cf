use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use super::{missing_partition, poisoned, Cursor, KvPair, Partition, StorageEngine};
use crate::core::SQLError;

type Table = Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>;

/// Volatile storage engine, everything is lost on drop.
#[derive(Default)]
pub struct MemoryStorage {
    partitions: RwLock<HashMap<String, Table>>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemoryStorage {
    fn open_partition(&self, name: &str, create: bool) -> Result<Box<dyn Partition>, SQLError> {
        let table = if create {
            self.partitions
                .write()
                .map_err(poisoned)?
                .entry(name.to_string())
                .or_default()
                .clone()
        } else {
            self.partitions
                .read()
                .map_err(poisoned)?
                .get(name)
                .cloned()
                .ok_or_else(|| missing_partition(name))?
        };

        Ok(Box::new(MemoryPartition {
            name: name.to_string(),
            table,
        }))
    }

    fn remove_partition(&self, name: &str) -> Result<(), SQLError> {
        self.partitions
            .write()
            .map_err(poisoned)?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| missing_partition(name))
    }

    fn generate_id(&self) -> Result<u64, SQLError> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn flush(&self) -> Result<(), SQLError> {
        Ok(())
    }
}

pub struct MemoryPartition {
    name: String,
    table: Table,
}

impl Partition for MemoryPartition {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), SQLError> {
        self.table
            .write()
            .map_err(poisoned)?
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SQLError> {
        Ok(self.table.read().map_err(poisoned)?.get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> Result<bool, SQLError> {
        Ok(self.table.write().map_err(poisoned)?.remove(key).is_some())
    }

    fn len(&self) -> Result<usize, SQLError> {
        Ok(self.table.read().map_err(poisoned)?.len())
    }

    fn cursor(&self) -> Result<Box<dyn Cursor>, SQLError> {
        Ok(Box::new(MemoryCursor {
            table: self.table.clone(),
            last_key: None,
        }))
    }
}

/// Remembers the last key returned and resumes strictly after it, so
/// writes between calls never invalidate the cursor.
pub struct MemoryCursor {
    table: Table,
    last_key: Option<Vec<u8>>,
}

impl Cursor for MemoryCursor {
    fn next_entry(&mut self) -> Result<Option<KvPair>, SQLError> {
        let table = self.table.read().map_err(poisoned)?;
        let lower = match &self.last_key {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };

        let entry = table
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
        if let Some((key, _)) = &entry {
            self.last_key = Some(key.clone());
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(cursor: &mut dyn Cursor) -> Vec<KvPair> {
        let mut entries = vec![];
        while let Some(entry) = cursor.next_entry().unwrap() {
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn point_operations() {
        let storage = MemoryStorage::new();
        let partition = storage.open_partition("users", true).unwrap();

        partition.put(b"k1", b"v1").unwrap();
        partition.put(b"k1", b"v2").unwrap();
        assert_eq!(partition.get(b"k1").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(partition.len().unwrap(), 1);
        assert!(partition.delete(b"k1").unwrap());
        assert!(!partition.delete(b"k1").unwrap());
        assert_eq!(partition.get(b"k1").unwrap(), None);
    }

    #[test]
    fn open_without_create_requires_existing_partition() {
        let storage = MemoryStorage::new();
        assert!(storage.open_partition("missing", false).is_err());
        storage.open_partition("present", true).unwrap();
        assert!(storage.open_partition("present", false).is_ok());
        storage.remove_partition("present").unwrap();
        assert!(storage.open_partition("present", false).is_err());
    }

    #[test]
    fn cursor_scans_everything_and_can_be_reopened() {
        let storage = MemoryStorage::new();
        let partition = storage.open_partition("t", true).unwrap();
        for i in 0u8..5 {
            partition.put(&[i], &[i * 10]).unwrap();
        }

        let mut cursor = partition.cursor().unwrap();
        assert_eq!(drain(cursor.as_mut()).len(), 5);
        // exhausted cursors stay exhausted
        assert_eq!(cursor.next_entry().unwrap(), None);

        let mut cursor = partition.cursor().unwrap();
        assert_eq!(cursor.next_entry().unwrap(), Some((vec![0], vec![0])));
    }

    #[test]
    fn generated_ids_are_unique() {
        let storage = MemoryStorage::new();
        let a = storage.generate_id().unwrap();
        let b = storage.generate_id().unwrap();
        assert_ne!(a, b);
    }
}
