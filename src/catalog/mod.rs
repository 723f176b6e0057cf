use std::{collections::BTreeMap, sync::Arc};

use log::info;

use self::defs::BaseRelationSchema;
use crate::{
    core::{ErrorKind, SQLError},
    storage::StorageEngine,
};

pub mod defs;

/// Partition holding one record per relation schema.
pub const METADATA_PARTITION: &str = "__metadata";

/// Names with this prefix belong to the system.
const RESERVED_PREFIX: &str = "__";

/// In-memory mirror of the persisted relation schemas.
///
/// Create and drop write to storage first and to memory last. The two are
/// not updated atomically: a storage fault between the steps leaves them
/// out of sync until the next restart reloads the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    relations: BTreeMap<String, Arc<BaseRelationSchema>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every persisted schema.
    pub fn load(storage: &dyn StorageEngine) -> Result<Self, SQLError> {
        let metadata = storage.open_partition(METADATA_PARTITION, true)?;
        let mut cursor = metadata.cursor()?;

        let mut catalog = Self::new();
        while let Some((_, value)) = cursor.next_entry()? {
            let schema = BaseRelationSchema::decode(&value)?;
            catalog
                .relations
                .insert(schema.name().to_string(), Arc::new(schema));
        }

        info!("Loaded {} relation(s) from catalog", catalog.relations.len());
        Ok(catalog)
    }

    pub fn create(
        &mut self,
        storage: &dyn StorageEngine,
        schema: BaseRelationSchema,
    ) -> Result<Arc<BaseRelationSchema>, SQLError> {
        let name = schema.name().to_string();
        if name.starts_with(RESERVED_PREFIX) {
            return Err(SQLError::new(
                ErrorKind::InvalidDefinition,
                format!("relation names starting with {} are reserved", RESERVED_PREFIX),
            ));
        }

        if self.exists(&name) {
            return Err(SQLError::new(
                ErrorKind::RelationExists,
                format!("relation {} already exists", name),
            ));
        }

        let metadata = storage.open_partition(METADATA_PARTITION, true)?;
        metadata.put(name.as_bytes(), &schema.encode())?;
        storage.open_partition(&name, true)?;

        let schema = Arc::new(schema);
        self.relations.insert(name.clone(), schema.clone());
        info!("Created relation {}", name);

        Ok(schema)
    }

    pub fn drop_relation(&mut self, storage: &dyn StorageEngine, name: &str) -> Result<(), SQLError> {
        if !self.exists(name) {
            return Err(SQLError::new(
                ErrorKind::RelationNotFound,
                format!("relation {} does not exist", name),
            ));
        }

        let metadata = storage.open_partition(METADATA_PARTITION, true)?;
        metadata.delete(name.as_bytes())?;
        storage.remove_partition(name)?;

        self.relations.remove(name);
        info!("Dropped relation {}", name);

        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<BaseRelationSchema>> {
        self.relations.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Relation names in ascending order.
    pub fn list_relations(&self) -> Vec<String> {
        self.relations.keys().cloned().collect()
    }
}
