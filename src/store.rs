//! Record storage seam.
//!
//! The import core never talks to a concrete database; it goes through the
//! [`RecordStore`] trait. [`MemoryStore`] is the in-memory implementation
//! used by tests and the CLI dry run. It mirrors the semantics the
//! reconciliation engine depends on: identity uniqueness per entity,
//! automatic identity assignment when a record is created without one, and
//! same-run writes being visible to later lookups.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::normalize::{ID_FIELD, Row};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record '{id}' already exists in '{entity}'")]
    Conflict { entity: String, id: String },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A persisted record of a dynamically typed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub entity: String,
    pub id: String,
    pub fields: Row,
}

impl Record {
    pub fn set(&mut self, field: &str, value: Option<String>) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|value| value.as_deref())
    }
}

/// Storage collaborator contract.
///
/// `create` takes the full field map (which may or may not contain an `id`);
/// `find_referencing` locates a record whose `field` holds `id`, which is
/// how the metadata attacher checks for an existing companion record.
pub trait RecordStore {
    fn get(&self, entity: &str, id: &str) -> Result<Option<Record>, StoreError>;
    fn create(&mut self, entity: &str, fields: Row) -> Result<Record, StoreError>;
    fn save(&mut self, record: &Record) -> Result<(), StoreError>;
    fn find_referencing(
        &self,
        entity: &str,
        field: &str,
        id: &str,
    ) -> Result<Option<Record>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, BTreeMap<String, Record>>,
    sequences: BTreeMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, entity: &str) -> usize {
        self.records.get(entity).map_or(0, BTreeMap::len)
    }

    pub fn record(&self, entity: &str, id: &str) -> Option<&Record> {
        self.records.get(entity).and_then(|table| table.get(id))
    }

    pub fn records(&self, entity: &str) -> impl Iterator<Item = &Record> {
        self.records.get(entity).into_iter().flat_map(BTreeMap::values)
    }

    fn next_id(&mut self, entity: &str) -> String {
        loop {
            let sequence = self.sequences.entry(entity.to_string()).or_insert(0);
            *sequence += 1;
            let candidate = sequence.to_string();
            let taken = self
                .records
                .get(entity)
                .is_some_and(|table| table.contains_key(&candidate));
            if !taken {
                return candidate;
            }
        }
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, entity: &str, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.record(entity, id).cloned())
    }

    fn create(&mut self, entity: &str, mut fields: Row) -> Result<Record, StoreError> {
        let id = match fields.get(ID_FIELD).cloned().flatten() {
            Some(id) => id,
            None => self.next_id(entity),
        };
        let table = self.records.entry(entity.to_string()).or_default();
        if table.contains_key(&id) {
            return Err(StoreError::Conflict {
                entity: entity.to_string(),
                id,
            });
        }
        fields.insert(ID_FIELD.to_string(), Some(id.clone()));
        let record = Record {
            entity: entity.to_string(),
            id: id.clone(),
            fields,
        };
        table.insert(id, record.clone());
        Ok(record)
    }

    fn save(&mut self, record: &Record) -> Result<(), StoreError> {
        let table = self
            .records
            .get_mut(&record.entity)
            .ok_or_else(|| StoreError::Backend(format!("unknown entity '{}'", record.entity)))?;
        match table.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(format!(
                "cannot save unknown record '{}' of '{}'",
                record.id, record.entity
            ))),
        }
    }

    fn find_referencing(
        &self,
        entity: &str,
        field: &str,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        let found = self
            .records
            .get(entity)
            .and_then(|table| table.values().find(|record| record.get(field) == Some(id)));
        Ok(found.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, Option<&str>)]) -> Row {
        pairs
            .iter()
            .map(|&(name, value)| (name.to_string(), value.map(str::to_string)))
            .collect()
    }

    #[test]
    fn create_rejects_duplicate_identity() {
        let mut store = MemoryStore::new();
        store
            .create("responses", fields(&[("id", Some("1")), ("name", Some("Alice"))]))
            .expect("first create");
        let err = store
            .create("responses", fields(&[("id", Some("1"))]))
            .expect_err("duplicate create");
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.count("responses"), 1);
    }

    #[test]
    fn create_assigns_sequential_identity_when_absent() {
        let mut store = MemoryStore::new();
        let first = store
            .create("responses_metadata", fields(&[("metadata", Some("7"))]))
            .expect("create without id");
        let second = store
            .create("responses_metadata", fields(&[("metadata", Some("8"))]))
            .expect("second create without id");
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert_eq!(first.get("id"), Some("1"));
    }

    #[test]
    fn save_updates_existing_records_only() {
        let mut store = MemoryStore::new();
        let mut record = store
            .create("responses", fields(&[("id", Some("1")), ("name", Some("Alice"))]))
            .expect("create");
        record.set("name", Some("Alicia".to_string()));
        store.save(&record).expect("save");
        assert_eq!(
            store.record("responses", "1").unwrap().get("name"),
            Some("Alicia")
        );

        let orphan = Record {
            entity: "responses".to_string(),
            id: "99".to_string(),
            fields: Row::new(),
        };
        assert!(store.save(&orphan).is_err());
    }

    #[test]
    fn find_referencing_matches_on_field_value() {
        let mut store = MemoryStore::new();
        store
            .create("responses_metadata", fields(&[("metadata", Some("3"))]))
            .expect("create");
        let hit = store
            .find_referencing("responses_metadata", "metadata", "3")
            .expect("query");
        assert!(hit.is_some());
        let miss = store
            .find_referencing("responses_metadata", "metadata", "4")
            .expect("query");
        assert!(miss.is_none());
    }
}
