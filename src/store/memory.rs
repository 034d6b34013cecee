//! In-memory record store.

use chrono::{Local, Utc};
use indexmap::IndexMap;
use log::info;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{carry_stamps, stamp_created, RecordStore, StoredRecord};
use crate::error::{Error, Result};
use crate::record::{DataRecord, DocumentFamily};

type Collections = HashMap<DocumentFamily, IndexMap<String, StoredRecord>>;

/// A store that keeps every collection in memory.
///
/// Useful for tests and one-shot CLI runs. Insertion order is listing
/// order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a family.
    pub fn len(&self, family: DocumentFamily) -> usize {
        self.read()
            .map(|c| c.get(&family).map_or(0, IndexMap::len))
            .unwrap_or(0)
    }

    /// Check whether a family has no records.
    pub fn is_empty(&self, family: DocumentFamily) -> bool {
        self.len(family) == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| Error::Other("record store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| Error::Other("record store lock poisoned".into()))
    }
}

fn not_found(family: DocumentFamily, id: &str) -> Error {
    Error::RecordNotFound(format!("{}/{}", family, id))
}

impl RecordStore for MemoryStore {
    fn insert(&self, family: DocumentFamily, mut record: DataRecord) -> Result<StoredRecord> {
        stamp_created(&mut record, Local::now());
        let stored = StoredRecord::new(Uuid::new_v4().to_string(), family, record, Utc::now());
        self.write()?
            .entry(family)
            .or_default()
            .insert(stored.id.clone(), stored.clone());
        info!("inserted {}/{}", family, stored.id);
        Ok(stored)
    }

    fn get(&self, family: DocumentFamily, id: &str) -> Result<StoredRecord> {
        self.read()?
            .get(&family)
            .and_then(|c| c.get(id))
            .cloned()
            .ok_or_else(|| not_found(family, id))
    }

    fn list(&self, family: DocumentFamily) -> Result<Vec<StoredRecord>> {
        Ok(self
            .read()?
            .get(&family)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    fn update(&self, family: DocumentFamily, id: &str, mut record: DataRecord) -> Result<StoredRecord> {
        let mut collections = self.write()?;
        let stored = collections
            .get_mut(&family)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| not_found(family, id))?;

        carry_stamps(&stored.data, &mut record);
        stored.data = record;
        stored.updated = Utc::now();
        info!("updated {}/{}", family, id);
        Ok(stored.clone())
    }

    fn delete(&self, family: DocumentFamily, id: &str) -> Result<()> {
        self.write()?
            .get_mut(&family)
            .and_then(|c| c.shift_remove(id))
            .map(|_| info!("deleted {}/{}", family, id))
            .ok_or_else(|| not_found(family, id))
    }
}
