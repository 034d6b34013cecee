//! Record persistence.
//!
//! One collection per [`DocumentFamily`]. Records are stamped with their
//! creation date and time on insert, the same `date_created` and
//! `time_created` fields the forms have always written.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{DataRecord, DocumentFamily};

/// Record field holding the creation date (`%Y-%m-%d`).
pub const DATE_CREATED: &str = "date_created";

/// Record field holding the creation time (`%H:%M:%S`).
pub const TIME_CREATED: &str = "time_created";

/// A record as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned identifier
    pub id: String,
    /// Collection the record belongs to
    pub family: DocumentFamily,
    /// When the record was inserted
    pub created: DateTime<Utc>,
    /// When the record was last written
    pub updated: DateTime<Utc>,
    /// Field values
    pub data: DataRecord,
}

impl StoredRecord {
    /// Create a new record with both timestamps set to `now`.
    pub fn new(id: impl Into<String>, family: DocumentFamily, data: DataRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            family,
            created: now,
            updated: now,
            data,
        }
    }

    /// The value that identifies this record in listings.
    pub fn headline(&self) -> &str {
        self.data
            .scalar(self.family.headline_key())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("(untitled)")
    }
}

/// Trait for record stores.
pub trait RecordStore: Send + Sync {
    /// Insert a record, returning it with its new id.
    fn insert(&self, family: DocumentFamily, record: DataRecord) -> Result<StoredRecord>;

    /// Fetch a record by id.
    fn get(&self, family: DocumentFamily, id: &str) -> Result<StoredRecord>;

    /// All records of a family, oldest first.
    fn list(&self, family: DocumentFamily) -> Result<Vec<StoredRecord>>;

    /// Replace a record's fields, keeping its id and creation stamps.
    fn update(&self, family: DocumentFamily, id: &str, record: DataRecord) -> Result<StoredRecord>;

    /// Delete a record.
    fn delete(&self, family: DocumentFamily, id: &str) -> Result<()>;
}

/// Write `date_created` and `time_created` into a record.
pub fn stamp_created(record: &mut DataRecord, at: DateTime<Local>) {
    record.insert(DATE_CREATED, at.format("%Y-%m-%d").to_string());
    record.insert(TIME_CREATED, at.format("%H:%M:%S").to_string());
}

/// Copy the creation stamps of `previous` into an edited record.
pub(crate) fn carry_stamps(previous: &DataRecord, record: &mut DataRecord) {
    for key in [DATE_CREATED, TIME_CREATED] {
        if let Some(value) = previous.scalar(key) {
            if !record.contains_key(key) {
                record.insert(key, value.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stamp_created() {
        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 5, 7).unwrap();
        let mut record = DataRecord::new();
        stamp_created(&mut record, at);
        assert_eq!(record.scalar(DATE_CREATED), Some("2026-10-16"));
        assert_eq!(record.scalar(TIME_CREATED), Some("09:05:07"));
    }

    #[test]
    fn test_carry_stamps_keeps_explicit_values() {
        let mut previous = DataRecord::new();
        previous.insert(DATE_CREATED, "2026-01-01");
        previous.insert(TIME_CREATED, "10:00:00");

        let mut edited = DataRecord::new();
        edited.insert(TIME_CREATED, "11:00:00");
        carry_stamps(&previous, &mut edited);

        assert_eq!(edited.scalar(DATE_CREATED), Some("2026-01-01"));
        assert_eq!(edited.scalar(TIME_CREATED), Some("11:00:00"));
    }

    #[test]
    fn test_headline() {
        let mut data = DataRecord::new();
        data.insert("invoice_no", "ZC/IN/0042");
        let record = StoredRecord::new("x", DocumentFamily::ExportInvoice, data, Utc::now());
        assert_eq!(record.headline(), "ZC/IN/0042");

        let empty = StoredRecord::new("y", DocumentFamily::PackingList, DataRecord::new(), Utc::now());
        assert_eq!(empty.headline(), "(untitled)");
    }
}
