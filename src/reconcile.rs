//! Reconciliation engine: update-or-create per normalized row.
//!
//! [`import`] is the full run entry point (normalize, pipeline, reconcile);
//! [`reconcile`] applies already-processed rows against the store. A run
//! tolerates per-row persistence failures: they are captured as
//! [`ErrorEntry`] values and the run continues. Only configuration faults
//! surfaced before the first row abort the run.

use std::collections::BTreeSet;

use log::info;

use crate::{
    attach::attach_metadata,
    error::ImportError,
    normalize::{self, ID_FIELD, Row},
    pipeline::{PipelineRegistry, PipelineStep},
    schema::{SchemaCatalog, TableSchema},
    store::RecordStore,
};

/// One captured per-row failure. The identity is absent when the row never
/// resolved one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub row_id: Option<String>,
    pub message: String,
}

/// Outcome of one import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub errors: Vec<ErrorEntry>,
    pub created: usize,
    pub updated: usize,
    /// Errors beyond [`ImportOptions::max_errors`], counted instead of kept.
    pub suppressed_errors: usize,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.suppressed_errors == 0
    }

    pub fn total_errors(&self) -> usize {
        self.errors.len() + self.suppressed_errors
    }

    fn push_error(&mut self, cap: Option<usize>, entry: ErrorEntry) {
        match cap {
            Some(cap) if self.errors.len() >= cap => self.suppressed_errors += 1,
            _ => self.errors.push(entry),
        }
    }
}

/// Run configuration, threaded explicitly into the entry point.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Pipeline step names to run per row, in order.
    pub pipeline: Vec<String>,
    /// Cap on reported error entries; `None` keeps every entry.
    pub max_errors: Option<usize>,
}

/// Runs a complete import: normalize the CSV text, resolve and apply the
/// configured pipeline, then reconcile every row in input order.
///
/// Pipeline-step resolution failure and malformed CSV are fatal and abort
/// before any row is written; everything else is recovered per row.
pub fn import(
    csv_text: &str,
    schema: &TableSchema,
    registry: &PipelineRegistry,
    options: &ImportOptions,
    store: &mut dyn RecordStore,
    catalog: &dyn SchemaCatalog,
) -> Result<ImportReport, ImportError> {
    let steps = registry.resolve(&options.pipeline)?;
    let mut rows = normalize::normalize(csv_text, schema)?;
    for row in &mut rows {
        run_pipeline(row, schema, &steps);
    }
    let report = reconcile(rows, schema, store, catalog, options.max_errors);
    info!(
        "Import into '{}' finished: {} created, {} updated, {} error(s)",
        schema.name,
        report.created,
        report.updated,
        report.total_errors()
    );
    Ok(report)
}

fn run_pipeline(row: &mut Row, schema: &TableSchema, steps: &[&dyn PipelineStep]) {
    for step in steps {
        step.run(row, &schema.columns);
    }
}

/// Applies processed rows against the store, strictly in input order.
///
/// Each row is looked up by its `id`: found records are updated field by
/// field through the declared-column allow-list, missing records are created
/// from `id` plus the allow-listed fields. A later row repeating an earlier
/// row's `id` sees that earlier write and takes the update path.
pub fn reconcile(
    rows: Vec<Row>,
    schema: &TableSchema,
    store: &mut dyn RecordStore,
    catalog: &dyn SchemaCatalog,
    max_errors: Option<usize>,
) -> ImportReport {
    let declared: BTreeSet<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    let mut report = ImportReport::default();
    for row in rows {
        reconcile_row(row, schema, &declared, store, catalog, max_errors, &mut report);
    }
    report
}

fn reconcile_row(
    row: Row,
    schema: &TableSchema,
    declared: &BTreeSet<&str>,
    store: &mut dyn RecordStore,
    catalog: &dyn SchemaCatalog,
    max_errors: Option<usize>,
    report: &mut ImportReport,
) {
    let row_id = row.get(ID_FIELD).cloned().flatten();

    let existing = match &row_id {
        Some(id) => match store.get(&schema.name, id) {
            Ok(found) => found,
            Err(err) => {
                report.push_error(
                    max_errors,
                    ErrorEntry {
                        row_id: row_id.clone(),
                        message: format!("error looking up record: {err}"),
                    },
                );
                return;
            }
        },
        // A row without identity can never match; it takes the create path
        // and the store decides whether to accept it.
        None => None,
    };

    match existing {
        Some(mut record) => {
            for (field, value) in &row {
                if field == ID_FIELD || !declared.contains(field.as_str()) {
                    continue;
                }
                record.set(field, value.clone());
            }
            match store.save(&record) {
                Ok(()) => report.updated += 1,
                Err(err) => report.push_error(
                    max_errors,
                    ErrorEntry {
                        row_id: Some(record.id),
                        message: format!("error updating: {err}"),
                    },
                ),
            }
        }
        None => {
            let fields: Row = row
                .into_iter()
                .filter(|(field, _)| field == ID_FIELD || declared.contains(field.as_str()))
                .collect();
            match store.create(&schema.name, fields) {
                Ok(record) => {
                    report.created += 1;
                    attach_metadata(&record, catalog, store);
                }
                Err(err) => report.push_error(
                    max_errors,
                    ErrorEntry {
                        row_id,
                        message: format!("error creating: {err}"),
                    },
                ),
            }
        }
    }
}
