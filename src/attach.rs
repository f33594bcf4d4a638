//! Metadata attachment.
//!
//! Every primary record gets at most one companion metadata record, created
//! lazily the first time the primary record is created. Attachment is
//! best-effort: most entities have no metadata companion, and nothing in
//! here is allowed to fail a primary-record import.

use log::{debug, warn};

use crate::{
    normalize::Row,
    schema::SchemaCatalog,
    store::{Record, RecordStore},
};

/// Field on the metadata record that holds the primary record's identity.
pub const METADATA_REFERENCE_FIELD: &str = "metadata";

/// Companion schema name derived from an entity name.
pub fn metadata_schema_name(entity: &str) -> String {
    format!("{entity}_metadata")
}

/// Ensures exactly one metadata record references `record`.
///
/// Safe to call repeatedly for the same record. A missing companion schema
/// is the expected case and returns silently; a failing catalog or store is
/// logged at warn and swallowed, since metadata reconciliation is
/// supplementary.
pub fn attach_metadata(record: &Record, catalog: &dyn SchemaCatalog, store: &mut dyn RecordStore) {
    let companion = metadata_schema_name(&record.entity);
    match catalog.lookup(&companion) {
        Ok(Some(_)) => {}
        Ok(None) => {
            debug!(
                "No metadata schema '{companion}' defined for '{}'; skipping attach",
                record.entity
            );
            return;
        }
        Err(err) => {
            // Catalog trouble is distinguishable from "not configured" but
            // still must not fail the primary import.
            warn!("Metadata schema lookup for '{companion}' failed: {err}");
            return;
        }
    }

    match store.find_referencing(&companion, METADATA_REFERENCE_FIELD, &record.id) {
        Ok(Some(existing)) => {
            debug!(
                "Metadata record '{}' already references '{}' of '{}'",
                existing.id, record.id, record.entity
            );
            return;
        }
        Ok(None) => {}
        Err(err) => {
            warn!(
                "Metadata duplicate check for '{}' of '{}' failed: {err}",
                record.id, record.entity
            );
            return;
        }
    }

    let mut fields = Row::new();
    fields.insert(
        METADATA_REFERENCE_FIELD.to_string(),
        Some(record.id.clone()),
    );
    if let Err(err) = store.create(&companion, fields) {
        warn!(
            "Failed to create metadata record for '{}' of '{}': {err}",
            record.id, record.entity
        );
    }
}
