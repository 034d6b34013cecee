//! Record store backed by a directory of JSON files.
//!
//! Layout: `<root>/<collection>/<uuid>.json`, one pretty-printed
//! [`StoredRecord`] per file.

use chrono::{Local, Utc};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{carry_stamps, stamp_created, RecordStore, StoredRecord};
use crate::error::{Error, Result};
use crate::record::{DataRecord, DocumentFamily};

/// A store writing one JSON file per record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("opened record store at {}", root.display());
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, family: DocumentFamily) -> PathBuf {
        self.root.join(family.as_str())
    }

    fn record_path(&self, family: DocumentFamily, id: &str) -> Result<PathBuf> {
        // Only store-issued ids are accepted, so an id can never name a path.
        let uuid = Uuid::parse_str(id)
            .map_err(|_| Error::RecordNotFound(format!("{}/{}", family, id)))?;
        Ok(self
            .collection_dir(family)
            .join(format!("{}.json", uuid.hyphenated())))
    }

    fn read_record(&self, path: &Path) -> Result<StoredRecord> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_record(&self, record: &StoredRecord) -> Result<()> {
        let dir = self.collection_dir(record.family);
        fs::create_dir_all(&dir)?;
        let path = self.record_path(record.family, &record.id)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn not_found_on_missing(err: Error, family: DocumentFamily, id: &str) -> Error {
    match err {
        Error::Io(e) if e.kind() == io::ErrorKind::NotFound => {
            Error::RecordNotFound(format!("{}/{}", family, id))
        }
        other => other,
    }
}

impl RecordStore for JsonFileStore {
    fn insert(&self, family: DocumentFamily, mut record: DataRecord) -> Result<StoredRecord> {
        stamp_created(&mut record, Local::now());
        let stored = StoredRecord::new(Uuid::new_v4().to_string(), family, record, Utc::now());
        self.write_record(&stored)?;
        info!("inserted {}/{}", family, stored.id);
        Ok(stored)
    }

    fn get(&self, family: DocumentFamily, id: &str) -> Result<StoredRecord> {
        let path = self.record_path(family, id)?;
        self.read_record(&path)
            .map_err(|e| not_found_on_missing(e, family, id))
    }

    fn list(&self, family: DocumentFamily) -> Result<Vec<StoredRecord>> {
        let dir = self.collection_dir(family);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable record {}: {}", path.display(), e),
            }
        }
        records.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    fn update(&self, family: DocumentFamily, id: &str, mut record: DataRecord) -> Result<StoredRecord> {
        let mut stored = self.get(family, id)?;
        carry_stamps(&stored.data, &mut record);
        stored.data = record;
        stored.updated = Utc::now();
        self.write_record(&stored)?;
        info!("updated {}/{}", family, id);
        Ok(stored)
    }

    fn delete(&self, family: DocumentFamily, id: &str) -> Result<()> {
        let path = self.record_path(family, id)?;
        fs::remove_file(&path)
            .map_err(|e| not_found_on_missing(e.into(), family, id))?;
        info!("deleted {}/{}", family, id);
        Ok(())
    }
}
